//! Message and progress notifications emitted during a run
//!
//! The harness never prints directly. Operation log lines go to
//! `EventHandler::on_message` and phase progress to `on_progress`.

use tracing::{debug, info};

/// Receiver of run messages and progress counters.
pub trait EventHandler {
    /// A log line (operation log, run banners).
    fn on_message(&mut self, _message: &str) {}

    /// `progress` items of `operation` have completed.
    fn on_progress(&mut self, _operation: &str, _progress: u64) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

/// Forwards messages and progress to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHandler;

impl EventHandler for TracingHandler {
    fn on_message(&mut self, message: &str) {
        info!(target: "kvformat::ops", "{}", message);
    }

    fn on_progress(&mut self, operation: &str, progress: u64) {
        debug!(target: "kvformat::progress", operation, progress, "progress");
    }
}

/// Keeps everything in memory; useful for inspecting a run afterwards.
#[derive(Debug, Default, Clone)]
pub struct RecordingHandler {
    /// Messages in arrival order
    pub messages: Vec<String>,
    /// Progress notifications in arrival order
    pub progress: Vec<(String, u64)>,
}

impl EventHandler for RecordingHandler {
    fn on_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn on_progress(&mut self, operation: &str, progress: u64) {
        self.progress.push((operation.to_string(), progress));
    }
}

impl<H: EventHandler + ?Sized> EventHandler for &mut H {
    fn on_message(&mut self, message: &str) {
        (**self).on_message(message)
    }

    fn on_progress(&mut self, operation: &str, progress: u64) {
        (**self).on_progress(operation, progress)
    }
}
