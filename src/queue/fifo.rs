/*!
 * FIFO State
 * Unsynchronized ordered container with optional de-duplication
 *
 * This is the storage both queue flavours share. It does no locking of its
 * own: `DedupQueue` wraps it in a mutex for direct callers, and
 * `BlockingQueue` keeps it under the lock its condvar is bound to.
 */

use super::config::QueueConfig;
use ahash::AHashSet;
use std::collections::VecDeque;
use std::hash::Hash;

/// Ordered container; head is the oldest element
///
/// In dedup mode `present` holds exactly the values in `sequence`, each of
/// which appears once.
#[derive(Debug, Clone)]
pub(crate) struct FifoState<T> {
    sequence: VecDeque<T>,
    present: Option<AHashSet<T>>,
}

impl<T> FifoState<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new(config: QueueConfig) -> Self {
        let capacity = config.capacity;
        Self {
            sequence: VecDeque::with_capacity(capacity),
            present: config
                .dedup
                .then(|| AHashSet::with_capacity(capacity)),
        }
    }

    #[inline]
    pub fn is_dedup(&self) -> bool {
        self.present.is_some()
    }

    /// Append `value` unless dedup mode already holds it
    pub fn push(&mut self, value: T) -> bool {
        if let Some(present) = &mut self.present {
            if present.contains(&value) {
                return false;
            }
            present.insert(value.clone());
        }
        self.sequence.push_back(value);
        true
    }

    /// Push each value in order, returning how many were accepted
    pub fn push_many<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter();
        self.sequence.reserve(values.size_hint().0);

        let mut added = 0;
        for value in values {
            if self.push(value) {
                added += 1;
            }
        }
        added
    }

    pub fn pop(&mut self) -> Option<T> {
        let value = self.sequence.pop_front()?;
        if let Some(present) = &mut self.present {
            present.remove(&value);
        }
        Some(value)
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.sequence.front()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        match &self.present {
            Some(present) => present.contains(value),
            None => self.sequence.contains(value),
        }
    }

    /// Remove the first occurrence of `value`, keeping the rest in order
    pub fn remove(&mut self, value: &T) -> bool {
        if let Some(present) = &self.present {
            if !present.contains(value) {
                return false;
            }
        }

        let Some(index) = self.sequence.iter().position(|v| v == value) else {
            return false;
        };
        self.sequence.remove(index);

        if let Some(present) = &mut self.present {
            present.remove(value);
        }
        true
    }

    pub fn clear(&mut self) {
        self.sequence.clear();
        if let Some(present) = &mut self.present {
            present.clear();
        }
    }

    /// Independent copy of the contents, head first
    pub fn snapshot(&self) -> Vec<T> {
        self.sequence.iter().cloned().collect()
    }
}
