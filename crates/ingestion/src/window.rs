//! Block windowing for bounded log queries.

use std::fmt;

/// Blocks per `eth_getLogs` call, within typical node range limits.
pub const DEFAULT_WINDOW_SIZE: u64 = 1000;

/// Inclusive block range scanned by one log query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub from: u64,
    pub to: u64,
}

impl BlockWindow {
    /// Number of blocks in the window.
    pub fn block_count(&self) -> u64 {
        self.to - self.from + 1
    }
}

impl fmt::Display for BlockWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Iterator over consecutive windows tiling `[start, head]`.
///
/// Yields nothing when `start > head`; every window but the last holds
/// exactly `size` blocks.
#[derive(Debug, Clone)]
pub struct BlockWindows {
    next: Option<u64>,
    head: u64,
    size: u64,
}

impl BlockWindows {
    /// # Arguments
    /// * `start` - First block to scan (the resume cursor)
    /// * `head` - Last block to scan, inclusive
    /// * `size` - Maximum blocks per window; zero is treated as one
    pub fn new(start: u64, head: u64, size: u64) -> Self {
        Self {
            next: (start <= head).then_some(start),
            head,
            size: size.max(1),
        }
    }
}

impl Iterator for BlockWindows {
    type Item = BlockWindow;

    fn next(&mut self) -> Option<BlockWindow> {
        let from = self.next?;
        let to = from.saturating_add(self.size - 1).min(self.head);
        self.next = if to < self.head { Some(to + 1) } else { None };
        Some(BlockWindow { from, to })
    }
}
