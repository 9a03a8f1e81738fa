//! Cooperative cancellation checked between files.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Token cancelled by Ctrl-C.
    ///
    /// The running analyzer shares the terminal's process group and gets the
    /// same interrupt; the orchestrator treats its failure as cancellation.
    pub fn on_interrupt() -> Self {
        let token = Self::new();
        let handle = token.clone();
        if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
            log::warn!("cannot install interrupt handler: {}", e);
        }
        token
    }
}
