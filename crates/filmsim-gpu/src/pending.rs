//! One-shot uploads queued between draws.

/// A value waiting to be consumed by the next draw.
///
/// Writing replaces any value not yet taken (last write wins); `take`
/// returns it once and clears the slot.
#[derive(Debug)]
pub struct PendingSlot<T> {
    value: Option<T>,
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> PendingSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a value, replacing any pending one.
    pub fn put(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Consume the pending value.
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn is_pending(&self) -> bool {
        self.value.is_some()
    }

    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Counts of uploads and frames performed by a preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadStats {
    pub image_uploads: u64,
    pub lut_uploads: u64,
    pub grain_uploads: u64,
    pub frames: u64,
}

/// Result of a draw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A frame was rendered.
    Drawn,
    /// Nothing to draw yet (no image was ever set).
    Skipped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_once() {
        let mut slot = PendingSlot::new();
        assert!(!slot.is_pending());
        slot.put(1);
        assert_eq!(slot.peek(), Some(&1));
        assert_eq!(slot.take(), Some(1));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut slot = PendingSlot::new();
        slot.put("a");
        slot.put("b");
        assert_eq!(slot.take(), Some("b"));
        assert!(!slot.is_pending());
    }
}
