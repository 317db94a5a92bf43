use crate::id::ResourceId;

/// Open/closed frame state carrying the backend's per-frame data.
#[derive(Debug)]
pub struct FrameSlot<F> {
    current: Option<F>,
    completed: u64,
}

impl<F> Default for FrameSlot<F> {
    fn default() -> Self {
        Self {
            current: None,
            completed: 0,
        }
    }
}

impl<F> FrameSlot<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Open a frame. Refused while one is already open; the open frame is
    /// kept and `frame` is handed back.
    pub fn open(&mut self, frame: F) -> Result<(), F> {
        if self.current.is_some() {
            tracing::warn!("begin_frame called inside an open frame");
            return Err(frame);
        }
        self.current = Some(frame);
        Ok(())
    }

    pub fn current_mut(&mut self) -> Option<&mut F> {
        self.current.as_mut()
    }

    /// Close the frame and hand its data back for submission.
    pub fn close(&mut self) -> Option<F> {
        let frame = self.current.take()?;
        self.completed += 1;
        Some(frame)
    }

    /// Drop an open frame without counting it.
    pub fn abandon(&mut self) -> Option<F> {
        self.current.take()
    }

    /// Frames opened and closed so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }
}

/// Remembers the last bound pipeline so redundant binds are skipped.
#[derive(Debug, Default, Clone)]
pub struct PipelineTracker {
    last: Option<ResourceId>,
}

impl PipelineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `pipeline` differs from the previous draw's; records it.
    pub fn should_bind(&mut self, pipeline: ResourceId) -> bool {
        if self.last == Some(pipeline) {
            return false;
        }
        self.last = Some(pipeline);
        true
    }

    pub fn current(&self) -> Option<ResourceId> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_cycle() {
        let mut slot = FrameSlot::new();
        assert!(!slot.is_open());
        assert!(slot.close().is_none());

        slot.open(7).unwrap();
        assert!(slot.is_open());
        *slot.current_mut().unwrap() += 1;
        assert_eq!(slot.close(), Some(8));
        assert!(!slot.is_open());
        assert_eq!(slot.completed(), 1);
    }

    #[test]
    fn nested_open_keeps_the_first_frame() {
        let mut slot = FrameSlot::new();
        slot.open("first").unwrap();
        assert_eq!(slot.open("second"), Err("second"));
        assert_eq!(slot.close(), Some("first"));
    }

    #[test]
    fn abandon_does_not_count() {
        let mut slot = FrameSlot::new();
        slot.open(()).unwrap();
        assert!(slot.abandon().is_some());
        assert_eq!(slot.completed(), 0);
    }

    #[test]
    fn tracker_skips_repeat_binds() {
        let mut tracker = PipelineTracker::new();
        assert!(tracker.should_bind(ResourceId(1)));
        assert!(!tracker.should_bind(ResourceId(1)));
        assert!(tracker.should_bind(ResourceId(2)));
        assert!(tracker.should_bind(ResourceId(1)));
        tracker.reset();
        assert!(tracker.should_bind(ResourceId(1)));
    }
}
