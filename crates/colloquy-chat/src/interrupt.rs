//! Caller-driven cancellation of an in-flight reply.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Polled by the session between generated tokens.
pub trait InterruptChecker {
    fn is_interrupted(&self) -> bool;
}

/// Shared flag, typically raised from a Ctrl+C handler.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    flag: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

impl InterruptChecker for InterruptFlag {
    fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
