//! Fixed-capacity outcome window.
//!
//! # Responsibilities
//! - Keep the last N outcome tags in arrival order
//! - Evict the oldest tag on overflow
//! - Answer "what share of the buffered calls failed?" in O(1)

use std::collections::VecDeque;

use crate::resilience::outcome::OutcomeKind;

/// Ring buffer of the most recent outcome tags.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    entries: VecDeque<OutcomeKind>,
    capacity: usize,
    failures: usize,
}

impl SlidingWindow {
    /// Create an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    /// Append a tag, evicting the oldest one when full.
    pub fn push(&mut self, kind: OutcomeKind) {
        if self.entries.len() == self.capacity {
            if let Some(OutcomeKind::Failure) = self.entries.pop_front() {
                self.failures -= 1;
            }
        }
        if kind == OutcomeKind::Failure {
            self.failures += 1;
        }
        self.entries.push_back(kind);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failure tags currently buffered.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Failure percentage (0.0 to 100.0) over the buffered tags, `None` when empty.
    pub fn failure_rate(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.failures as f32 * 100.0 / self.entries.len() as f32)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OutcomeKind::{Failure, Success};

    #[test]
    fn test_empty_window_has_no_rate() {
        let window = SlidingWindow::new(5);
        assert!(window.is_empty());
        assert_eq!(window.failure_rate(), None);
    }

    #[test]
    fn test_failure_rate() {
        let mut window = SlidingWindow::new(5);
        for kind in [Success, Success, Failure, Failure, Failure] {
            window.push(kind);
        }
        assert_eq!(window.len(), 5);
        assert_eq!(window.failures(), 3);
        assert_eq!(window.failure_rate(), Some(60.0));
    }

    #[test]
    fn test_oldest_entry_evicted() {
        let mut window = SlidingWindow::new(3);
        window.push(Failure);
        window.push(Success);
        window.push(Success);
        assert_eq!(window.failures(), 1);

        // The leading failure falls out of the window.
        window.push(Success);
        assert_eq!(window.len(), 3);
        assert_eq!(window.failures(), 0);
        assert_eq!(window.failure_rate(), Some(0.0));
    }

    #[test]
    fn test_clear() {
        let mut window = SlidingWindow::new(2);
        window.push(Failure);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.failures(), 0);
        window.push(Success);
        assert_eq!(window.failure_rate(), Some(0.0));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut window = SlidingWindow::new(0);
        window.push(Failure);
        window.push(Success);
        assert_eq!(window.len(), 1);
        assert_eq!(window.failure_rate(), Some(0.0));
    }
}
