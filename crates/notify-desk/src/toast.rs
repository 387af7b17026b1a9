//! Transient toast state

use campus_notify::Notification;
use std::time::{Duration, Instant};

/// How long a toast stays up without user interaction.
pub const TOAST_DURATION: Duration = Duration::from_secs(8);

/// One visible toast. Expiry is driven by the caller's clock through
/// [`DeskEndpoint::tick`](crate::DeskEndpoint::tick); nothing here sleeps
/// or spawns timers.
#[derive(Debug, Clone)]
pub struct Toast {
    /// The notification being summarized.
    pub notification: Notification,
    /// When the toast appeared.
    pub shown_at: Instant,
    /// When the toast auto-dismisses.
    pub deadline: Instant,
}

impl Toast {
    /// Create a toast shown at the given instant.
    pub fn new(notification: Notification, shown_at: Instant) -> Self {
        Self {
            notification,
            shown_at,
            deadline: shown_at + TOAST_DURATION,
        }
    }

    /// Whether the toast should be gone at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Time left before auto-dismissal.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}
