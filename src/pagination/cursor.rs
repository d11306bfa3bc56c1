//! Offset cursor
//!
//! Tracks how far a paged walk has progressed against the total reported
//! by the source.

/// Default page size for VK collection methods
pub const DEFAULT_STEP: u64 = 100;

/// Forward-only offset cursor.
///
/// The cursor is ACTIVE while `total > offset` and DONE afterwards. The
/// only transition is ACTIVE → DONE, caused by [`OffsetCursor::advance`]
/// crossing `total`. Each fetch call owns its own cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCursor {
    total: u64,
    offset: u64,
    step: u64,
}

impl OffsetCursor {
    /// Create a cursor at `start_offset` advancing by `step`.
    ///
    /// A zero step is bumped to 1 so every advance makes progress.
    pub fn new(total: u64, start_offset: u64, step: u64) -> Self {
        Self {
            total,
            offset: start_offset,
            step: step.max(1),
        }
    }

    /// Create a cursor starting at offset 0
    pub fn with_step(total: u64, step: u64) -> Self {
        Self::new(total, 0, step)
    }

    /// Whether there are records left to request
    pub fn continues(&self) -> bool {
        self.total > self.offset
    }

    /// Move the offset forward by `custom_step`, or by the configured step
    pub fn advance(&mut self, custom_step: Option<u64>) {
        let step = custom_step.unwrap_or(self.step);
        self.offset = self.offset.saturating_add(step);
    }

    /// Offset to send with the next request
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Upper bound on records for this walk
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Configured per-page step
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Replace the total if the source revises it mid-walk
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }
}

impl Default for OffsetCursor {
    fn default() -> Self {
        Self::with_step(0, DEFAULT_STEP)
    }
}
