use arch::Word;

use crate::error::VmError;

/// Word blocks addressed by 1-based handles. Handle 0 is null.
/// Live blocks hold at most `limit` words in total.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    blocks: Vec<Option<Vec<Word>>>,
    used: usize,
    limit: usize,
}

impl Heap {
    pub fn new(limit: usize) -> Self {
        Heap {
            blocks: vec![],
            used: 0,
            limit,
        }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    fn reserve(&mut self, words: usize) -> Result<(), VmError> {
        match self.used.checked_add(words) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => Err(VmError::HeapExhausted(self.limit)),
        }
    }

    pub fn alloc(&mut self, block: Vec<Word>) -> Result<i64, VmError> {
        self.reserve(block.len())?;
        self.blocks.push(Some(block));
        Ok(self.blocks.len() as i64)
    }

    /// Allocate `count` zeroed words. The size is checked before any memory is taken.
    pub fn alloc_zeroed(&mut self, count: usize) -> Result<i64, VmError> {
        self.reserve(count)?;
        self.blocks.push(Some(vec![Word::ZERO; count]));
        Ok(self.blocks.len() as i64)
    }

    fn index(handle: i64) -> Option<usize> {
        handle.checked_sub(1).and_then(|i| usize::try_from(i).ok())
    }

    pub fn get(&self, handle: i64) -> Result<&[Word], VmError> {
        Self::index(handle)
            .and_then(|i| self.blocks.get(i))
            .and_then(Option::as_deref)
            .ok_or(VmError::InvalidHandle(handle))
    }

    fn get_mut(&mut self, handle: i64) -> Result<&mut Vec<Word>, VmError> {
        Self::index(handle)
            .and_then(|i| self.blocks.get_mut(i))
            .and_then(Option::as_mut)
            .ok_or(VmError::InvalidHandle(handle))
    }

    pub fn free(&mut self, handle: i64) -> Result<(), VmError> {
        let block = Self::index(handle)
            .and_then(|i| self.blocks.get_mut(i))
            .and_then(Option::take)
            .ok_or(VmError::InvalidHandle(handle))?;
        self.used -= block.len();
        Ok(())
    }

    pub fn load(&self, handle: i64, index: i64) -> Result<Word, VmError> {
        let block = self.get(handle)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| block.get(i))
            .copied()
            .ok_or(VmError::HeapIndexOutOfBounds(handle, index))
    }

    pub fn store(&mut self, handle: i64, index: i64, value: Word) -> Result<(), VmError> {
        let block = self.get_mut(handle)?;
        let cell = usize::try_from(index)
            .ok()
            .and_then(|i| block.get_mut(i))
            .ok_or(VmError::HeapIndexOutOfBounds(handle, index))?;
        *cell = value;
        Ok(())
    }

    /// Live blocks with their handles.
    pub fn live(&self) -> impl Iterator<Item = (i64, &[Word])> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_deref().map(|b| (i as i64 + 1, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_one_based() {
        let mut heap = Heap::new(16);
        let h = heap.alloc(vec![Word::from_int(7)]).unwrap();
        assert_eq!(h, 1);
        assert_eq!(heap.load(h, 0), Ok(Word::from_int(7)));
        assert_eq!(heap.load(0, 0), Err(VmError::InvalidHandle(0)));
        assert_eq!(heap.get(i64::MIN), Err(VmError::InvalidHandle(i64::MIN)));
        assert_eq!(heap.free(i64::MIN), Err(VmError::InvalidHandle(i64::MIN)));
    }

    #[test]
    fn free_then_use() {
        let mut heap = Heap::new(16);
        let h = heap.alloc_zeroed(2).unwrap();
        heap.store(h, 1, Word::from_int(3)).unwrap();
        assert_eq!(
            heap.store(h, 2, Word::ZERO),
            Err(VmError::HeapIndexOutOfBounds(h, 2))
        );
        heap.free(h).unwrap();
        assert_eq!(heap.free(h), Err(VmError::InvalidHandle(h)));
        assert_eq!(heap.live().count(), 0);
        assert_eq!(heap.used(), 0);
    }

    #[test]
    fn limit() {
        let mut heap = Heap::new(4);
        let h = heap.alloc_zeroed(3).unwrap();
        assert_eq!(heap.alloc(vec![Word::ZERO; 2]), Err(VmError::HeapExhausted(4)));
        assert_eq!(heap.alloc_zeroed(usize::MAX), Err(VmError::HeapExhausted(4)));
        heap.free(h).unwrap();
        assert_eq!(heap.alloc_zeroed(4), Ok(2));
        assert_eq!(heap.used(), 4);
    }
}
