//! Query builder for notifications

use super::notification::{now_millis, Notification, NotificationKind, Priority};
use super::store::{NotificationStore, NotifyResult};

/// Milliseconds in one day.
const DAY_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Filter parameters for selecting notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    /// Filter by recipient user code.
    pub recipient: Option<String>,
    /// Filter by sender user code.
    pub sender: Option<String>,
    /// Filter by notification kind.
    pub kind: Option<NotificationKind>,
    /// Keep only unread notifications.
    pub unread_only: bool,
    /// Filter by minimum priority.
    pub min_priority: Option<Priority>,
    /// Filter by start timestamp, unix millis (inclusive).
    pub since: Option<u64>,
    /// Filter by end timestamp, unix millis (inclusive).
    pub until: Option<u64>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
    /// Sort order (true = newest first).
    pub newest_first: bool,
}

impl NotificationQuery {
    /// Create a new empty query, newest first.
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Check if a notification matches this query.
    pub fn matches(&self, notification: &Notification) -> bool {
        if let Some(ref recipient) = self.recipient {
            if &notification.recipient != recipient {
                return false;
            }
        }

        if let Some(ref sender) = self.sender {
            if &notification.sender != sender {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if notification.kind != kind {
                return false;
            }
        }

        if self.unread_only && notification.read {
            return false;
        }

        if let Some(min) = self.min_priority {
            if notification.priority < min {
                return false;
            }
        }

        if let Some(since) = self.since {
            if notification.timestamp < since {
                return false;
            }
        }

        if let Some(until) = self.until {
            if notification.timestamp > until {
                return false;
            }
        }

        true
    }
}

/// Timestamp marking the start of a window of `days` days ago.
pub fn since_days_ago(days: u64) -> u64 {
    now_millis().saturating_sub(days * DAY_MILLIS)
}

/// Builder for constructing notification queries against a store.
pub struct NotificationQueryBuilder<'a> {
    store: &'a dyn NotificationStore,
    query: NotificationQuery,
}

impl<'a> NotificationQueryBuilder<'a> {
    /// Create a new query builder.
    pub fn new(store: &'a dyn NotificationStore) -> Self {
        Self {
            store,
            query: NotificationQuery::new(),
        }
    }

    /// Filter by recipient user code.
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.query.recipient = Some(recipient.into());
        self
    }

    /// Filter by sender user code.
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.query.sender = Some(sender.into());
        self
    }

    /// Filter by kind.
    pub fn kind(mut self, kind: NotificationKind) -> Self {
        self.query.kind = Some(kind);
        self
    }

    /// Keep only unread notifications.
    pub fn unread_only(mut self) -> Self {
        self.query.unread_only = true;
        self
    }

    /// Filter by minimum priority.
    pub fn min_priority(mut self, priority: Priority) -> Self {
        self.query.min_priority = Some(priority);
        self
    }

    /// Filter notifications from a timestamp (unix millis, inclusive).
    pub fn since(mut self, timestamp: u64) -> Self {
        self.query.since = Some(timestamp);
        self
    }

    /// Filter notifications until a timestamp (unix millis, inclusive).
    pub fn until(mut self, timestamp: u64) -> Self {
        self.query.until = Some(timestamp);
        self
    }

    /// Keep only notifications from the last `days` days.
    pub fn recent(mut self, days: u64) -> Self {
        self.query.since = Some(since_days_ago(days));
        self
    }

    /// Limit results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Set offset for pagination.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Sort newest first (default).
    pub fn newest_first(mut self) -> Self {
        self.query.newest_first = true;
        self
    }

    /// Sort oldest first.
    pub fn oldest_first(mut self) -> Self {
        self.query.newest_first = false;
        self
    }

    /// Execute the query.
    pub fn fetch(self) -> NotifyResult<Vec<Notification>> {
        self.store.fetch(&self.query)
    }

    /// Count matching notifications.
    pub fn count(self) -> NotifyResult<usize> {
        self.store.count(&self.query)
    }

    /// Get the built query.
    pub fn build(self) -> NotificationQuery {
        self.query
    }
}
