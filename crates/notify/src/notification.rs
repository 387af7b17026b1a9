//! Notification record types

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a notification.
pub type NotificationId = String;

/// Categories of events a notification can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A grade was recorded for a student
    GradeAdded,
    /// An existing grade was changed
    GradeUpdated,
    /// An absence was recorded
    AbsenceRecorded,
    /// A module was assigned to a professor
    ModuleAssigned,
    /// A user account was created
    AccountCreated,
    /// A user account was modified
    AccountUpdated,
    /// A student inscription was validated
    InscriptionValidated,
    /// A password was reset
    PasswordReset,
    /// A system-wide announcement
    Announcement,
}

impl NotificationKind {
    /// Check if this kind concerns a student's academic record.
    pub fn is_academic(&self) -> bool {
        matches!(
            self,
            NotificationKind::GradeAdded
                | NotificationKind::GradeUpdated
                | NotificationKind::AbsenceRecorded
                | NotificationKind::ModuleAssigned
                | NotificationKind::InscriptionValidated
        )
    }

    /// Check if this kind concerns account administration.
    pub fn is_account(&self) -> bool {
        matches!(
            self,
            NotificationKind::AccountCreated
                | NotificationKind::AccountUpdated
                | NotificationKind::PasswordReset
        )
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::GradeAdded => write!(f, "grade_added"),
            NotificationKind::GradeUpdated => write!(f, "grade_updated"),
            NotificationKind::AbsenceRecorded => write!(f, "absence_recorded"),
            NotificationKind::ModuleAssigned => write!(f, "module_assigned"),
            NotificationKind::AccountCreated => write!(f, "account_created"),
            NotificationKind::AccountUpdated => write!(f, "account_updated"),
            NotificationKind::InscriptionValidated => write!(f, "inscription_validated"),
            NotificationKind::PasswordReset => write!(f, "password_reset"),
            NotificationKind::Announcement => write!(f, "announcement"),
        }
    }
}

/// Delivery priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Normal - routine events
    #[default]
    Normal,
    /// Urgent - shown more prominently by endpoints
    Urgent,
}

/// One notification addressed to one user.
///
/// Created exclusively through
/// [`NotificationDispatcher::notify`](crate::NotificationDispatcher::notify);
/// after creation only the `read` flag ever changes, and only from `false`
/// to `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier (UUID-format string).
    pub id: NotificationId,
    /// Event category.
    pub kind: NotificationKind,
    /// Short human-readable title.
    pub title: String,
    /// Free-text body.
    pub message: String,
    /// User code of the addressee. Never empty.
    pub recipient: String,
    /// User code that triggered the event. May equal `recipient` for
    /// self-service actions such as a password change.
    pub sender: String,
    /// Delivery priority.
    pub priority: Priority,
    /// Whether the recipient has seen this notification.
    pub read: bool,
    /// Creation instant, unix milliseconds. Set once.
    pub timestamp: u64,
    /// Store-assigned insertion sequence. Breaks timestamp ties so
    /// most-recent-first ordering is exact.
    #[serde(default)]
    pub seq: u64,
}

impl Notification {
    /// Create a new unread notification for the given recipient.
    pub fn new(kind: NotificationKind, recipient: impl Into<String>) -> Self {
        Self {
            id: generate_notification_id(),
            kind,
            title: String::new(),
            message: String::new(),
            recipient: recipient.into(),
            sender: String::new(),
            priority: Priority::Normal,
            read: false,
            timestamp: now_millis(),
            seq: 0,
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the message body.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the sender user code.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Mark as urgent.
    pub fn urgent(mut self) -> Self {
        self.priority = Priority::Urgent;
        self
    }

    /// Check whether this notification is still unread.
    pub fn is_unread(&self) -> bool {
        !self.read
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Convert to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Current time as unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Generate a unique notification ID.
fn generate_notification_id() -> String {
    use rand::{rngs::OsRng, RngCore};

    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);

    // Format as UUID-like string
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
