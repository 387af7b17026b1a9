//! Notification store trait

use super::notification::Notification;
use super::query::{NotificationQuery, NotificationQueryBuilder};
use serde::Serialize;

/// Result type for notification store operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur in the notification subsystem.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Failed to write to the notification store.
    #[error("Failed to write notification: {0}")]
    WriteError(String),

    /// Failed to read from the notification store.
    #[error("Failed to read notifications: {0}")]
    ReadError(String),

    /// Storage is full and eviction is disabled.
    #[error("Notification storage is full")]
    StorageFull,

    /// A notification was created with an empty recipient code.
    #[error("Notification recipient must not be empty")]
    EmptyRecipient,
}

/// Aggregate counts for one recipient, used to drive badge and header
/// displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationStats {
    /// All notifications stored for the recipient.
    pub total: usize,
    /// Notifications not yet marked read.
    pub unread: usize,
    /// Notifications created within the recency window
    /// ([`RECENT_WINDOW_DAYS`]).
    pub recent: usize,
}

/// Default recency window, in days, for "recent" queries and stats.
pub const RECENT_WINDOW_DAYS: u64 = 7;

/// Trait for notification storage backends.
///
/// Mutating operations are recipient-scoped where authorization depends on
/// it: `delete` looks a notification up under the given recipient first, so
/// an id collision can never remove another user's notification. Operations
/// on ids that do not exist are silent no-ops reported through the return
/// value, never errors.
pub trait NotificationStore: Send + Sync {
    /// Append a notification, assigning its insertion sequence. Returns the
    /// stored copy. Rejects records with an empty recipient with
    /// [`NotifyError::EmptyRecipient`].
    fn append(&self, notification: Notification) -> NotifyResult<Notification>;

    /// Get one notification by id, scoped to the given recipient.
    fn get(&self, recipient: &str, id: &str) -> NotifyResult<Option<Notification>>;

    /// Create a query builder.
    fn query(&self) -> NotificationQueryBuilder<'_>
    where
        Self: Sized,
    {
        NotificationQueryBuilder::new(self)
    }

    /// Execute a query and return matching notifications.
    fn fetch(&self, query: &NotificationQuery) -> NotifyResult<Vec<Notification>>;

    /// Count notifications matching the query.
    fn count(&self, query: &NotificationQuery) -> NotifyResult<usize>;

    /// Count unread notifications for a recipient.
    fn unread_count(&self, recipient: &str) -> NotifyResult<usize>;

    /// Mark one notification read. Idempotent: returns `true` only when an
    /// unread notification was actually flipped.
    fn mark_read(&self, id: &str) -> NotifyResult<bool>;

    /// Mark every notification of a recipient read. Returns how many were
    /// flipped.
    fn mark_all_read(&self, recipient: &str) -> NotifyResult<usize>;

    /// Delete one notification, scoped to the given recipient. Returns
    /// `true` if it existed.
    fn delete(&self, recipient: &str, id: &str) -> NotifyResult<bool>;

    /// Delete every notification of a recipient. Returns how many were
    /// removed.
    fn delete_all(&self, recipient: &str) -> NotifyResult<usize>;

    /// Aggregate counts for a recipient.
    fn stats(&self, recipient: &str) -> NotifyResult<NotificationStats>;

    /// Total number of stored notifications, all recipients.
    fn total_count(&self) -> NotifyResult<usize>;

    /// Remove everything (for tests).
    fn clear(&self) -> NotifyResult<()>;
}
