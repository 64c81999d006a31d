use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot readiness flag shared between build workers and the frame thread.
///
/// Opened with release ordering by the terminal join's continuation and read
/// with acquire ordering every frame, so everything published before `open`
/// is visible to a frame that observes the gate open.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    open: AtomicBool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Opens the gate. Returns `true` only for the call that actually opened it.
    pub fn open(&self) -> bool {
        !self.open.swap(true, Ordering::AcqRel)
    }

    /// Closes the gate ahead of a teardown or rebuild.
    pub fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_once_until_closed() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_open());
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_open());
        assert!(gate.close());
        assert!(!gate.is_open());
        assert!(gate.open());
    }
}
