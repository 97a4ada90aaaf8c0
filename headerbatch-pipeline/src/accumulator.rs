//! Fixed-size batch buffer.

use std::num::NonZeroUsize;

use thiserror::Error;

/// Errors from the batch accumulator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccumulatorError {
    /// The batch is full and must be drained before the next push.
    #[error("batch is full ({batch_size} entries), drain before pushing")]
    Full { batch_size: usize },
}

/// Buffers entries until `batch_size` have arrived.
///
/// Entries keep arrival order. [`drain`](Self::drain) hands the batch off and
/// resets the buffer in a single step.
#[derive(Debug, Clone)]
pub struct BatchAccumulator<T> {
    batch_size: NonZeroUsize,
    pending: Vec<T>,
}

impl<T> BatchAccumulator<T> {
    /// Create an empty accumulator.
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            pending: Vec::with_capacity(batch_size.get()),
        }
    }

    /// Append an entry. Fails if the batch is already full.
    pub fn push(&mut self, entry: T) -> Result<(), AccumulatorError> {
        if self.is_full() {
            return Err(AccumulatorError::Full {
                batch_size: self.batch_size.get(),
            });
        }
        self.pending.push(entry);
        Ok(())
    }

    /// Whether the batch has reached `batch_size`.
    pub fn is_full(&self) -> bool {
        self.pending.len() == self.batch_size.get()
    }

    /// Take the buffered entries and reset to empty.
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size.get()))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Buffered entries, oldest first.
    pub fn pending(&self) -> &[T] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc(size: usize) -> BatchAccumulator<u32> {
        BatchAccumulator::new(NonZeroUsize::new(size).expect("non-zero"))
    }

    #[test]
    fn fills_and_drains() {
        let mut a = acc(3);
        assert!(a.is_empty());
        a.push(1).expect("push");
        a.push(2).expect("push");
        assert!(!a.is_full());
        a.push(3).expect("push");
        assert!(a.is_full());

        assert_eq!(a.drain(), vec![1, 2, 3]);
        assert!(a.is_empty());
        assert!(!a.is_full());
        assert_eq!(a.len(), 0);
    }

    #[test]
    fn next_push_starts_fresh_batch() {
        let mut a = acc(2);
        a.push(1).expect("push");
        a.push(2).expect("push");
        let _ = a.drain();
        a.push(3).expect("push");
        assert_eq!(a.pending(), &[3]);
    }

    #[test]
    fn push_into_full_batch_fails() {
        let mut a = acc(1);
        a.push(1).expect("push");
        assert_eq!(a.push(2), Err(AccumulatorError::Full { batch_size: 1 }));
        assert_eq!(a.drain(), vec![1]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let mut a = acc(4);
        for v in [5, 5, 1, 5] {
            a.push(v).expect("push");
        }
        assert_eq!(a.drain(), vec![5, 5, 1, 5]);
    }
}
