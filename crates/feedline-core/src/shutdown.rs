//! Shutdown requests from signal handlers

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide flag polled by the pipeline between events
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Ask the running pipeline to stop.
///
/// Returns whether a shutdown had already been requested, so a second
/// signal can force exit.
pub fn request_shutdown() -> bool {
    shutdown_flag().swap(true, Ordering::Relaxed)
}
