//! Per-panel view state.

/// View state of one dashboard panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    /// Feed shown in this panel.
    pub feed_id: String,
    /// Index of the first visible record.
    pub scroll_offset: usize,
    /// Whether the panel holds input focus.
    pub focused: bool,
    /// Snapshot version drawn by the last frame.
    pub last_rendered_version: Option<u64>,
    /// Records in the snapshot last synced into this panel.
    pub record_count: usize,
}

impl PanelState {
    /// Create view state for `feed_id`.
    pub fn new(feed_id: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            scroll_offset: 0,
            focused: false,
            last_rendered_version: None,
            record_count: 0,
        }
    }

    /// Largest valid scroll offset.
    pub fn max_offset(&self) -> usize {
        self.record_count.saturating_sub(1)
    }

    /// Move the scroll position by `delta` records. Returns whether it moved.
    pub fn scroll(&mut self, delta: isize) -> bool {
        let target = self
            .scroll_offset
            .saturating_add_signed(delta)
            .min(self.max_offset());
        self.set_offset(target)
    }

    /// Jump to an absolute offset, clamped. Returns whether it moved.
    pub fn set_offset(&mut self, offset: usize) -> bool {
        let offset = offset.min(self.max_offset());
        let moved = offset != self.scroll_offset;
        self.scroll_offset = offset;
        moved
    }

    /// Record the size of a new snapshot, clamping the scroll position.
    pub fn sync(&mut self, record_count: usize) {
        self.record_count = record_count;
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }
}
