//! User-facing notices raised by gallery operations.
//!
//! Delivery is fire-and-forget: a notifier never reports back and a missing
//! listener is not an error.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub(crate) const MSG_UPLOADED: &str = "Image added successfully";
pub(crate) const MSG_UPLOAD_FAILED: &str = "Failed to save image data: ";
pub(crate) const MSG_STORAGE_ADVICE: &str = "To fix Supabase storage permissions, go to Supabase dashboard → Storage → website-images bucket → Policies → Add a policy for INSERT operations";
pub(crate) const MSG_UPDATE_DEFAULT: &str = "Cannot update default images";
pub(crate) const MSG_UPDATED: &str = "Image updated successfully";
pub(crate) const MSG_UPDATE_FAILED: &str = "Failed to update image: ";
pub(crate) const MSG_DELETE_DEFAULT: &str = "Cannot delete default images";
pub(crate) const MSG_DELETED: &str = "Image deleted successfully";
pub(crate) const MSG_DELETE_FAILED: &str = "Failed to delete image: ";
pub(crate) const MSG_REORDERED: &str = "Images reordered";
pub(crate) const MSG_UNEXPECTED: &str = "An unexpected error occurred";

pub(crate) const STORAGE_ADVICE_DURATION: Duration = Duration::from_millis(8000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub duration: Option<Duration>,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            duration: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log. Used when no presentation layer is attached.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let message = notice.message.as_str();
        match notice.severity {
            Severity::Success | Severity::Info => info!(severity = ?notice.severity, "{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// Fans notices out to any number of subscribers, e.g. a UI toast layer.
pub struct BroadcastNotifier {
    events: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.events.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: Notice) {
        let _ = self.events.send(notice);
    }
}
