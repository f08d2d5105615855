use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancellation token for the accept loop.
///
/// The loop checks it once per poll interval, so it stops at most one
/// interval after [`Shutdown::trigger`].
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
