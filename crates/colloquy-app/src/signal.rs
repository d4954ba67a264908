//! Ctrl+C handling.
//!
//! While a reply is being generated, Ctrl+C raises the session's interrupt
//! flag and the turn is rolled back. At the prompt it ends the program.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colloquy_chat::InterruptFlag;

/// Marks the span during which Ctrl+C interrupts a reply.
#[derive(Debug, Clone, Default)]
pub struct GeneratingGuard {
    active: Arc<AtomicBool>,
}

impl GeneratingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

/// Register the process-wide Ctrl+C handler. Can only succeed once.
pub fn install(flag: InterruptFlag, generating: GeneratingGuard) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        if generating.is_active() {
            flag.raise();
        } else {
            eprintln!();
            tracing::info!("Interrupted at prompt, exiting");
            std::process::exit(130);
        }
    })
}
