//! Notification adapter that routes messages to `tracing`.

use super::ports::Notifier;

/// [`Notifier`] implementation for headless use: warnings and errors
/// become tracing events instead of UI toasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "actioncore::notify", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "actioncore::notify", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "actioncore::notify", "{message}");
    }
}
