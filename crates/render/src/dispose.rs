use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared disposed marker. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct DisposeFlag(Arc<AtomicBool>);

impl DisposeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. Returns true only for the call that flipped it.
    pub fn mark_disposed(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_disposed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_mark_wins() {
        let flag = DisposeFlag::new();
        assert!(!flag.is_disposed());
        assert!(flag.mark_disposed());
        assert!(!flag.mark_disposed());
        assert!(flag.is_disposed());
    }

    #[test]
    fn clones_share_state() {
        let flag = DisposeFlag::new();
        let other = flag.clone();
        other.mark_disposed();
        assert!(flag.is_disposed());
        assert!(!flag.mark_disposed());
    }
}
