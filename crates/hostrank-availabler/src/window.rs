//! Sliding window of probe outcomes for one host.

/// Default number of outcomes a window remembers.
pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// Fixed-capacity ring of success/failure outcomes with a running failure
/// count, so [`failure_rate`](Window::failure_rate) is O(1).
///
/// A fresh window is full of successes. Invariant:
/// `0 <= failure_count <= capacity`.
#[derive(Debug, Clone)]
pub struct Window {
    slots: Vec<bool>,
    /// Index of the oldest outcome, overwritten by the next `put`.
    oldest: usize,
    failure_count: usize,
}

impl Window {
    /// Creates a window remembering `capacity` outcomes. A zero capacity falls
    /// back to [`DEFAULT_WINDOW_SIZE`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_WINDOW_SIZE
        } else {
            capacity
        };
        Self {
            slots: vec![true; capacity],
            oldest: 0,
            failure_count: 0,
        }
    }

    /// Records an outcome, evicting the oldest one.
    pub fn put(&mut self, success: bool) {
        let evicted = std::mem::replace(&mut self.slots[self.oldest], success);
        if !evicted {
            self.failure_count -= 1;
        }
        if !success {
            self.failure_count += 1;
        }
        self.oldest = (self.oldest + 1) % self.slots.len();
    }

    /// Share of failures among the remembered outcomes, in `[0, 1]`.
    pub fn failure_rate(&self) -> f64 {
        self.failure_count as f64 / self.slots.len() as f64
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}
