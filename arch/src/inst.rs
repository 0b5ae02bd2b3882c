use crate::{error::DecodeError, op::OpCode, syscall::SyscallCode, word::Word};

use color_print::cformat;

/// Concrete, executable instruction. Placeholder opcodes have no variant
/// here; the assembler rewrites them before a stream can be decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inst {
    NOOP,
    PUSH(Word),
    POP,

    IADD,
    ISUB,
    IMUL,
    IDIV,
    DADD,
    DSUB,
    DMUL,
    DDIV,

    SLOAD(u64),
    SSTORE(u64),

    EQ,
    NEQ,

    JUMP(u64),
    JUMPZ(u64),
    JUMPNZ(u64),
    SYSCALL(SyscallCode),
    SWAP,
    CALL(u64, u64),
    RET,

    PACK(u64),
    SCAT,
    HLOAD,
    HSTORE,
}

impl Inst {
    pub fn op(&self) -> OpCode {
        match self {
            Inst::NOOP => OpCode::NOOP,
            Inst::PUSH(_) => OpCode::PUSH,
            Inst::POP => OpCode::POP,
            Inst::IADD => OpCode::IADD,
            Inst::ISUB => OpCode::ISUB,
            Inst::IMUL => OpCode::IMUL,
            Inst::IDIV => OpCode::IDIV,
            Inst::DADD => OpCode::DADD,
            Inst::DSUB => OpCode::DSUB,
            Inst::DMUL => OpCode::DMUL,
            Inst::DDIV => OpCode::DDIV,
            Inst::SLOAD(_) => OpCode::SLOAD,
            Inst::SSTORE(_) => OpCode::SSTORE,
            Inst::EQ => OpCode::EQ,
            Inst::NEQ => OpCode::NEQ,
            Inst::JUMP(_) => OpCode::JUMP,
            Inst::JUMPZ(_) => OpCode::JUMPZ,
            Inst::JUMPNZ(_) => OpCode::JUMPNZ,
            Inst::SYSCALL(_) => OpCode::SYSCALL,
            Inst::SWAP => OpCode::SWAP,
            Inst::CALL(_, _) => OpCode::CALL,
            Inst::RET => OpCode::RET,
            Inst::PACK(_) => OpCode::PACK,
            Inst::SCAT => OpCode::SCAT,
            Inst::HLOAD => OpCode::HLOAD,
            Inst::HSTORE => OpCode::HSTORE,
        }
    }

    pub fn size(&self) -> usize {
        self.op().size()
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.op().into());
        match self {
            Inst::PUSH(w) => out.extend_from_slice(w.bytes()),
            Inst::SLOAD(n)
            | Inst::SSTORE(n)
            | Inst::JUMP(n)
            | Inst::JUMPZ(n)
            | Inst::JUMPNZ(n)
            | Inst::PACK(n) => out.extend_from_slice(&n.to_le_bytes()),
            Inst::CALL(addr, count) => {
                out.extend_from_slice(&addr.to_le_bytes());
                out.extend_from_slice(&count.to_le_bytes());
            }
            Inst::SYSCALL(code) => out.push((*code).into()),
            _ => {}
        }
    }

    /// Decode the instruction starting at byte offset `at`.
    pub fn decode(bytes: &[u8], at: usize) -> Result<Inst, DecodeError> {
        let tag = *bytes.get(at).ok_or(DecodeError::IpOutOfBounds(at))?;
        let op = OpCode::try_from(tag).map_err(|_| DecodeError::UnknownOpCode(tag))?;
        if op.is_placeholder() {
            return Err(DecodeError::Unresolved(op));
        }
        let body = bytes
            .get(at + 1..at + op.size())
            .ok_or(DecodeError::IpOverflow(at))?;

        let word = |i: usize| Word::read(&body[i * Word::SIZE..]).unwrap_or_default();
        let uint = |i: usize| word(i).as_uint();

        let inst = match op {
            OpCode::NOOP => Inst::NOOP,
            OpCode::PUSH => Inst::PUSH(word(0)),
            OpCode::POP => Inst::POP,
            OpCode::IADD => Inst::IADD,
            OpCode::ISUB => Inst::ISUB,
            OpCode::IMUL => Inst::IMUL,
            OpCode::IDIV => Inst::IDIV,
            OpCode::DADD => Inst::DADD,
            OpCode::DSUB => Inst::DSUB,
            OpCode::DMUL => Inst::DMUL,
            OpCode::DDIV => Inst::DDIV,
            OpCode::SLOAD => Inst::SLOAD(uint(0)),
            OpCode::SSTORE => Inst::SSTORE(uint(0)),
            OpCode::EQ => Inst::EQ,
            OpCode::NEQ => Inst::NEQ,
            OpCode::JUMP => Inst::JUMP(uint(0)),
            OpCode::JUMPZ => Inst::JUMPZ(uint(0)),
            OpCode::JUMPNZ => Inst::JUMPNZ(uint(0)),
            OpCode::SYSCALL => {
                let code = body[0];
                Inst::SYSCALL(
                    SyscallCode::try_from(code)
                        .map_err(|_| DecodeError::UnknownSyscallCode(code))?,
                )
            }
            OpCode::SWAP => Inst::SWAP,
            OpCode::CALL => Inst::CALL(uint(0), uint(1)),
            OpCode::RET => Inst::RET,
            OpCode::PACK => Inst::PACK(uint(0)),
            OpCode::SCAT => Inst::SCAT,
            OpCode::HLOAD => Inst::HLOAD,
            OpCode::HSTORE => Inst::HSTORE,
            OpCode::PUSHI
            | OpCode::PUSHD
            | OpCode::JUMPL
            | OpCode::JUMPZL
            | OpCode::JUMPNZL
            | OpCode::CALLL => return Err(DecodeError::Unresolved(op)),
        };
        Ok(inst)
    }

    /// Decode a whole stream from offset 0, pairing each instruction with its offset.
    pub fn decode_all(bytes: &[u8]) -> Result<Vec<(usize, Inst)>, DecodeError> {
        let mut insts = vec![];
        let mut at = 0;
        while at < bytes.len() {
            let inst = Inst::decode(bytes, at)?;
            insts.push((at, inst));
            at += inst.size();
        }
        Ok(insts)
    }
}

impl Inst {
    pub fn cformat(&self) -> String {
        macro_rules! op {
            ($name:expr) => {
                cformat!("<r>{:<8}</>", $name)
            };
            ($name:expr, $arg:expr) => {
                cformat!("<r>{:<8}</><y>{}</>", $name, $arg)
            };
            ($name:expr, $arg1:expr, $arg2:expr) => {
                cformat!("<r>{:<8}</><y>{} {}</>", $name, $arg1, $arg2)
            };
        }

        macro_rules! addr {
            ($name:expr, $addr:expr) => {
                cformat!("<r>{:<8}</><b>0x{:0>4X}</>", $name, $addr)
            };
        }

        match self {
            Inst::PUSH(w) => op!("push", w),
            Inst::SLOAD(n) => op!("sload", n),
            Inst::SSTORE(n) => op!("sstore", n),
            Inst::JUMP(a) => addr!("jump", a),
            Inst::JUMPZ(a) => addr!("jumpz", a),
            Inst::JUMPNZ(a) => addr!("jumpnz", a),
            Inst::SYSCALL(code) => op!("syscall", code),
            Inst::CALL(a, n) => cformat!("<r>{:<8}</><b>0x{:0>4X}</> <y>{}</>", "call", a, n),
            Inst::PACK(n) => op!("pack", n),
            inst => op!(inst.op().to_string().to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_inst {
        ($($name:ident: $inst:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let inst = $inst;
                    let mut bin = vec![];
                    inst.encode(&mut bin);
                    assert_eq!(bin.len(), inst.size());
                    assert_eq!(Inst::decode(&bin, 0), Ok(inst));
                }
            )*
        }
    }

    test_inst! {
        test_noop: Inst::NOOP,
        test_push: Inst::PUSH(Word::from_int(-42)),
        test_push_double: Inst::PUSH(Word::from_double(1.5)),
        test_sload: Inst::SLOAD(3),
        test_jumpz: Inst::JUMPZ(0x0123),
        test_syscall: Inst::SYSCALL(SyscallCode::PRINTS),
        test_call: Inst::CALL(0x40, 2),
        test_pack: Inst::PACK(5),
    }

    #[test]
    fn push_layout() {
        let mut bin = vec![];
        Inst::PUSH(Word::from_int(5)).encode(&mut bin);
        assert_eq!(bin, vec![1, 5, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn reject_placeholder() {
        let bin = [u8::from(OpCode::PUSHI), 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            Inst::decode(&bin, 0),
            Err(DecodeError::Unresolved(OpCode::PUSHI))
        );
    }

    #[test]
    fn reject_truncated() {
        let bin = [u8::from(OpCode::JUMP), 1, 2];
        assert_eq!(Inst::decode(&bin, 0), Err(DecodeError::IpOverflow(0)));
        assert_eq!(Inst::decode(&bin, 3), Err(DecodeError::IpOutOfBounds(3)));
        assert_eq!(
            Inst::decode(&[0xEE], 0),
            Err(DecodeError::UnknownOpCode(0xEE))
        );
        assert_eq!(
            Inst::decode(&[u8::from(OpCode::SYSCALL), 0x77], 0),
            Err(DecodeError::UnknownSyscallCode(0x77))
        );
    }

    #[test]
    fn decode_stream_offsets() {
        let mut bin = vec![];
        for inst in [Inst::PUSH(Word::from_int(1)), Inst::POP, Inst::JUMP(0)] {
            inst.encode(&mut bin);
        }
        let offsets: Vec<usize> = Inst::decode_all(&bin)
            .unwrap()
            .into_iter()
            .map(|(at, _)| at)
            .collect();
        assert_eq!(offsets, vec![0, 9, 10]);
    }
}
