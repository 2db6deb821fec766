//! Fixed-capacity history buffers
//!
//! Oldest entries are evicted once the buffer is full, so pushes never
//! allocate and the length never exceeds `N`.

use crate::types::{Direction, SensorSnapshot};

/// Recent turn decisions, newest last
pub type MoveHistory = History<Direction, 10>;

/// Recent sensor reads, newest last
pub type ObstacleHistory = History<SensorSnapshot, 5>;

/// Ring buffer that drops its oldest entry on overflow
#[derive(Debug, Clone)]
pub struct History<T: Copy, const N: usize> {
    data: [Option<T>; N],
    tail: usize, // Oldest entry
    len: usize,
}

impl<T: Copy, const N: usize> History<T, N> {
    pub fn new() -> Self {
        Self {
            data: [None; N],
            tail: 0,
            len: 0,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append an entry, evicting the oldest one when full.
    pub fn push(&mut self, value: T) {
        if N == 0 {
            return;
        }
        if self.len == N {
            self.data[self.tail] = Some(value);
            self.tail = (self.tail + 1) % N;
        } else {
            self.data[(self.tail + self.len) % N] = Some(value);
            self.len += 1;
        }
    }

    /// Entry at logical index, 0 being the oldest
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        if index < self.len {
            self.data[(self.tail + index) % N]
        } else {
            None
        }
    }

    /// Most recent entry
    pub fn last(&self) -> Option<T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// The newest `n` entries (fewer if the buffer holds less), oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = T> + '_ {
        let skip = self.len.saturating_sub(n);
        self.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.data = [None; N];
        self.tail = 0;
        self.len = 0;
    }
}

impl<T: Copy + PartialEq, const N: usize> History<T, N> {
    /// Number of entries equal to `value`
    pub fn count(&self, value: T) -> usize {
        self.iter().filter(|v| *v == value).count()
    }

    /// True when the newest `n` entries exist and all equal `value`
    pub fn ends_with_run(&self, value: T, n: usize) -> bool {
        n > 0 && self.len >= n && self.recent(n).all(|v| v == value)
    }
}

impl<T: Copy, const N: usize> Default for History<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> FromIterator<T> for History<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut history = Self::new();
        for value in iter {
            history.push(value);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::{Left, Right};

    #[test]
    fn test_basic_operations() {
        let mut h: History<u8, 4> = History::new();
        assert!(h.is_empty());

        h.push(1);
        h.push(2);
        h.push(3);
        assert_eq!(h.len(), 3);
        assert_eq!(h.get(0), Some(1));
        assert_eq!(h.last(), Some(3));
        assert_eq!(h.get(3), None);
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut h: History<u8, 3> = History::new();
        for v in 1..=5 {
            h.push(v);
        }

        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn test_move_history_never_exceeds_capacity() {
        let mut h = MoveHistory::new();
        for i in 0..25 {
            h.push(if i % 2 == 0 { Left } else { Right });
            assert!(h.len() <= 10);
        }
        assert_eq!(h.len(), 10);
        assert_eq!(h.capacity(), 10);
    }

    #[test]
    fn test_recent_and_runs() {
        let h: MoveHistory = [Right, Left, Left, Left].into_iter().collect();

        assert_eq!(h.recent(2).collect::<Vec<_>>(), vec![Left, Left]);
        assert_eq!(h.recent(10).count(), 4);
        assert!(h.ends_with_run(Left, 3));
        assert!(!h.ends_with_run(Left, 4));
        assert!(!h.ends_with_run(Left, 5));
        assert_eq!(h.count(Left), 3);
        assert_eq!(h.count(Right), 1);
    }

    #[test]
    fn test_clear() {
        let mut h: ObstacleHistory = History::new();
        h.push(SensorSnapshot::boxed_in());
        h.clear();

        assert!(h.is_empty());
        assert_eq!(h.last(), None);
        h.push(SensorSnapshot::clear());
        assert_eq!(h.get(0), Some(SensorSnapshot::clear()));
    }
}
