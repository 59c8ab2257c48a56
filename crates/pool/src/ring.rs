use std::collections::VecDeque;

/// Storage shared by [`Chunk`](crate::Chunk) and
/// [`BoundedRing`](crate::BoundedRing): a queue that never grows past the
/// size it was built with.
///
/// A push into a full ring drops the head and hands it back, so callers
/// that must not lose data check [`is_full`](Self::is_full) first. Owners
/// add their own locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring<T> {
    slots: VecDeque<T>,
    capacity: usize,
}

impl<T> Ring<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring needs at least one slot");
        Self {
            slots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `value`, returning whatever had to make room for it.
    pub fn push(&mut self, value: T) -> Option<T> {
        let displaced = if self.is_full() {
            self.slots.pop_front()
        } else {
            None
        };
        self.slots.push_back(value);
        displaced
    }

    pub fn pop(&mut self) -> Option<T> {
        self.slots.pop_front()
    }

    pub fn front(&self) -> Option<&T> {
        self.slots.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.slots.back()
    }

    /// Queue order: next to pop first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    /// The queued values as two runs, for copying out without a scratch
    /// buffer. The second run is empty unless the storage wrapped.
    pub fn as_slices(&self) -> (&[T], &[T]) {
        self.slots.as_slices()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many more values fit before a push displaces one.
    pub fn remaining(&self) -> usize {
        self.capacity - self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub(crate) fn into_inner(self) -> VecDeque<T> {
        self.slots
    }
}

impl<T> Extend<T> for Ring<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filling_a_byte_ring_leaves_room_count() {
        let mut bytes = Ring::new(8);
        bytes.extend(*b"tcp");

        assert_eq!(bytes.len(), 3);
        assert_eq!(bytes.remaining(), 5);
        assert!(!bytes.is_full());
        assert_eq!(bytes.iter().copied().collect::<Vec<u8>>(), b"tcp");
    }

    #[test]
    fn push_into_full_ring_hands_back_the_head() {
        let mut bytes = Ring::new(2);

        assert_eq!(bytes.push(0xAAu8), None);
        assert_eq!(bytes.push(0xBB), None);
        assert_eq!(bytes.push(0xCC), Some(0xAA));
        assert_eq!(bytes.push(0x00), Some(0xBB));

        assert!(bytes.is_full());
        assert_eq!(bytes.remaining(), 0);
        assert_eq!((bytes.front(), bytes.back()), (Some(&0xCC), Some(&0x00)));
    }

    #[test]
    fn pop_drains_in_push_order() {
        let mut slots = Ring::new(4);
        slots.extend(["first", "second", "third"]);

        assert_eq!(slots.pop(), Some("first"));
        assert_eq!(slots.pop(), Some("second"));
        assert_eq!(slots.pop(), Some("third"));
        assert_eq!(slots.pop(), None);
        assert!(slots.is_empty());
    }

    #[test]
    fn wrapped_storage_reads_back_in_order() {
        let mut bytes = Ring::new(4);
        bytes.extend([1u8, 2, 3, 4]);
        bytes.pop();
        bytes.pop();
        bytes.extend([5, 6]);

        let (head, tail) = bytes.as_slices();
        assert_eq!([head, tail].concat(), vec![3, 4, 5, 6]);
        assert_eq!(Vec::from(bytes.into_inner()), vec![3, 4, 5, 6]);
    }

    #[test]
    #[should_panic(expected = "at least one slot")]
    fn zero_slots_are_rejected() {
        let _ = Ring::<u8>::new(0);
    }
}
