//! # Ring Buffer
//!
//! ```text
//!  capacity = 8, first = 5, last = 2, len = 5
//!
//!  index:  0   1   2   3   4   5   6   7
//!        ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!        │ d │ e │   │   │   │ a │ b │ c │
//!        └───┴───┴───┴───┴───┴───┴───┴───┘
//!                  ▲ last      ▲ first
//!
//!  after growth to 16 the wrapped segment [5, 8) moves to [13, 16):
//!
//!  index:  0   1   2  ...  13  14  15
//!        │ d │ e │   │ ... │ a │ b │ c │
//! ```

use std::ops::Range;

/// Relocation performed when a [`RingBuffer`] doubled its capacity.
///
/// Arrays indexed in parallel with the ring call [`Growth::apply`] so that
/// each element keeps following the slot it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Growth {
    /// Capacity before growing.
    pub old_capacity: usize,
    /// Capacity after growing.
    pub new_capacity: usize,
    /// Start of the wrapped segment before the move.
    pub moved_from: usize,
    /// Start of the wrapped segment after the move.
    pub moved_to: usize,
    /// Number of slots moved. Zero when the live range did not wrap.
    pub moved_len: usize,
}

impl Growth {
    /// Replays this growth on a parallel array.
    ///
    /// The array is first resized to the new capacity (new slots hold
    /// `T::default()`), then the wrapped segment is copied to its new home.
    pub fn apply<T: Clone + Default>(&self, slots: &mut Vec<T>) {
        if slots.len() < self.new_capacity {
            slots.resize(self.new_capacity, T::default());
        }
        if self.moved_len == 0 {
            return;
        }
        let (head, tail) = slots.split_at_mut(self.moved_to);
        tail[..self.moved_len]
            .clone_from_slice(&head[self.moved_from..self.moved_from + self.moved_len]);
    }
}

/// A growable circular array.
///
/// Live entries occupy the circular range `[first, last)`. Pushing writes
/// at `last`; retiring advances `first`. The ring doubles as soon as it
/// becomes full, so `len < capacity` holds between calls.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Backing storage. Its length is the capacity.
    slots: Vec<T>,
    /// Physical index of the oldest entry.
    first: usize,
    /// Physical index one past the newest entry.
    last: usize,
    /// Number of entries in `[first, last)`.
    len: usize,
}

impl<T: Clone + Default> RingBuffer<T> {
    /// Creates an empty ring with `capacity` default-initialized slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            slots: vec![T::default(); capacity],
            first: 0,
            last: 0,
            len: 0,
        }
    }

    /// Appends `value` at the tail.
    ///
    /// Returns the physical slot the value was written to, and the
    /// [`Growth`] record if the ring doubled. The returned slot index is
    /// still valid after the growth: only the wrapped segment behind it
    /// moves.
    pub fn push_back(&mut self, value: T) -> (usize, Option<Growth>) {
        let slot = self.last;
        self.slots[slot] = value;
        self.len += 1;

        let growth = if self.len >= self.slots.len() {
            Some(self.grow())
        } else {
            None
        };

        self.last = (self.last + 1) % self.slots.len();
        (slot, growth)
    }

    /// Doubles the capacity, moving the wrapped segment to the end.
    fn grow(&mut self) -> Growth {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity * 2;

        let mut growth = Growth {
            old_capacity,
            new_capacity,
            moved_from: self.first,
            moved_to: self.first,
            moved_len: 0,
        };

        if self.last < self.first {
            growth.moved_len = old_capacity - self.first;
            growth.moved_to = new_capacity - growth.moved_len;
        }

        growth.apply(&mut self.slots);
        self.first = growth.moved_to;

        tracing::debug!(old_capacity, new_capacity, moved = growth.moved_len, "ring buffer grew");
        growth
    }
}

impl<T> RingBuffer<T> {
    /// Number of entries in the live range.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the live range is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Physical index of the oldest entry.
    #[inline]
    #[must_use]
    pub fn first_index(&self) -> usize {
        self.first
    }

    /// Physical index one past the newest entry.
    #[inline]
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.last
    }

    /// Maps a logical position (0 = oldest) to a physical slot.
    #[inline]
    #[must_use]
    pub fn physical_index(&self, logical: usize) -> usize {
        (self.first + logical) % self.slots.len()
    }

    /// Entry at logical position `logical`, oldest first.
    #[must_use]
    pub fn get(&self, logical: usize) -> Option<&T> {
        (logical < self.len).then(|| &self.slots[self.physical_index(logical)])
    }

    /// Mutable entry at logical position `logical`.
    pub fn get_mut(&mut self, logical: usize) -> Option<&mut T> {
        if logical < self.len {
            let index = self.physical_index(logical);
            Some(&mut self.slots[index])
        } else {
            None
        }
    }

    /// Raw slot storage, including slots outside the live range.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    /// Mutable raw slot storage.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [T] {
        &mut self.slots
    }

    /// The live range as at most two contiguous physical ranges.
    ///
    /// The second range is empty unless the live range wraps.
    #[must_use]
    pub fn segments(&self) -> [Range<usize>; 2] {
        if self.len == 0 {
            [0..0, 0..0]
        } else if self.first < self.last {
            [self.first..self.last, 0..0]
        } else {
            [self.first..self.slots.len(), 0..self.last]
        }
    }

    /// Iterates the live range, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let [a, b] = self.segments();
        self.slots[a].iter().chain(self.slots[b].iter())
    }

    /// Retires entries from the head while `retired` returns `true`.
    ///
    /// Returns the number of entries retired.
    pub fn pop_front_while(&mut self, mut retired: impl FnMut(&T) -> bool) -> usize {
        let mut count = 0;
        while self.len > 0 && retired(&self.slots[self.first]) {
            self.first = (self.first + 1) % self.slots.len();
            self.len -= 1;
            count += 1;
        }
        count
    }

    /// Empties the live range without touching capacity.
    pub fn clear(&mut self) {
        self.first = 0;
        self.last = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, values: &[u32]) -> RingBuffer<u32> {
        let mut ring = RingBuffer::with_capacity(capacity);
        for &v in values {
            ring.push_back(v);
        }
        ring
    }

    #[test]
    fn test_push_and_pop() {
        let mut ring = filled(8, &[1, 2, 3]);
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.pop_front_while(|&v| v < 3), 2);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.get(0), Some(&3));
        assert_eq!(ring.first_index(), 2);
        assert_eq!(ring.last_index(), 3);
    }

    #[test]
    fn test_grows_when_full_without_wrap() {
        let mut ring = RingBuffer::with_capacity(4);
        for v in 0..3 {
            assert!(ring.push_back(v).1.is_none());
        }
        let (slot, growth) = ring.push_back(3);
        let growth = growth.expect("fourth push fills a ring of four");
        assert_eq!(slot, 3);
        assert_eq!(growth.new_capacity, 8);
        assert_eq!(growth.moved_len, 0);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_growth_preserves_wrapped_order() {
        let mut ring = filled(4, &[0, 1, 2]);
        ring.pop_front_while(|&v| v < 2);
        // Live: [2] at index 2; wrap around with three more pushes.
        ring.push_back(3);
        ring.push_back(4);
        let before: Vec<u32> = ring.iter().copied().collect();
        let (_, growth) = ring.push_back(5);
        let growth = growth.expect("ring of four filled");

        assert_eq!(growth.moved_from, 2);
        assert_eq!(growth.moved_len, 2);
        assert_eq!(growth.moved_to, 6);
        assert_eq!(ring.capacity(), 8);

        let mut expected = before;
        expected.push(5);
        let after: Vec<u32> = (0..ring.len()).map(|i| *ring.get(i).unwrap()).collect();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_parallel_array_follows_growth() {
        let mut ring = filled(4, &[10, 11, 12]);
        let mut tags: Vec<u32> = ring.slots().iter().map(|v| v + 100).collect();
        ring.pop_front_while(|&v| v == 10);
        ring.push_back(13);
        tags[3] = 113;
        let (slot, growth) = ring.push_back(14);
        tags[slot] = 114;
        growth.expect("ring of four filled").apply(&mut tags);

        for i in 0..ring.len() {
            let physical = ring.physical_index(i);
            assert_eq!(tags[physical], ring.slots()[physical] + 100);
        }
    }

    #[test]
    fn test_segments_wrap() {
        let mut ring = filled(4, &[0, 1, 2]);
        ring.pop_front_while(|&v| v < 2);
        ring.push_back(3);
        let [a, b] = ring.segments();
        assert_eq!(a, 2..4);
        assert_eq!(b, 0..0);
        ring.push_back(4);
        let [a, b] = ring.segments();
        assert_eq!(a, 2..4);
        assert_eq!(b, 0..1);
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than zero")]
    fn test_zero_capacity_panics() {
        let _ = RingBuffer::<u32>::with_capacity(0);
    }
}
