use std::fmt;

/// 8-byte VM cell. Read as a little-endian `i64` or as an `f64`; which one
/// is meaningful depends on the opcode that consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word([u8; Word::SIZE]);

impl Word {
    pub const SIZE: usize = 8;
    pub const ZERO: Word = Word([0; Word::SIZE]);

    pub fn from_int(v: i64) -> Self {
        Word(v.to_le_bytes())
    }

    pub fn from_double(v: f64) -> Self {
        Word(v.to_le_bytes())
    }

    pub fn from_bool(v: bool) -> Self {
        Word::from_int(v as i64)
    }

    pub fn as_int(&self) -> i64 {
        i64::from_le_bytes(self.0)
    }

    pub fn as_uint(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    pub fn as_double(&self) -> f64 {
        f64::from_le_bytes(self.0)
    }

    pub fn as_bool(&self) -> bool {
        self.as_int() != 0
    }

    pub fn bytes(&self) -> &[u8; Word::SIZE] {
        &self.0
    }

    /// Read a word from the first 8 bytes of `bytes`.
    pub fn read(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; Word::SIZE] = bytes.get(..Word::SIZE)?.try_into().ok()?;
        Some(Word(raw))
    }
}

impl From<i64> for Word {
    fn from(v: i64) -> Self {
        Word::from_int(v)
    }
}

impl From<f64> for Word {
    fn from(v: f64) -> Self {
        Word::from_double(v)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_int())
    }
}

impl fmt::UpperHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}
