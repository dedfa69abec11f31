//! Stacking Module
//!
//! Window z-order. Index 0 is the front: it is hit-tested first and
//! composited last.

use tracing::debug;

/// Index of a window in the desktop's window table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub usize);

/// Front-to-back ordered list of windows, without duplicates
#[derive(Debug, Clone, Default)]
pub struct WindowStack {
    order: Vec<WindowId>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Add a window behind every other window; a window already present is left in place
    pub fn push_back(&mut self, window: WindowId) {
        if !self.order.contains(&window) {
            self.order.push(window);
        }
    }

    /// Move the window at `index` to the front
    ///
    /// Windows in front of it each move back one slot, so the relative order
    /// of every other window is preserved.
    pub fn move_to_front(&mut self, index: usize) {
        if index == 0 || index >= self.order.len() {
            return;
        }
        self.order[..=index].rotate_right(1);
        debug!("Promoted {:?} from index {} to front", self.order[0], index);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Hit-test / render order
    pub fn front_to_back(&self) -> impl DoubleEndedIterator<Item = WindowId> + '_ {
        self.order.iter().copied()
    }

    /// Composite order
    pub fn back_to_front(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.order.iter().rev().copied()
    }

    #[cfg(test)]
    pub fn as_slice(&self) -> &[WindowId] {
        &self.order
    }
}
