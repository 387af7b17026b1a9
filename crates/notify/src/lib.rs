//! # campus-notify
//!
//! In-process notification store and dispatcher for the campus-suite
//! desktop applications.
//!
//! A [`NotificationDispatcher`] is constructed once at process start and
//! shared (behind an `Arc`) with every window or controller. Business
//! actions create notifications through it; the dispatcher stores each
//! record recipient-scoped and fans it out synchronously to every
//! registered [`NotificationObserver`]. Observers self-filter by recipient.
//!
//! All state is in-memory and process-lifetime; there is no persistence.
//!
//! # Example
//!
//! ```rust
//! use campus_notify::NotificationDispatcher;
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(NotificationDispatcher::new());
//!
//! // A professor records a grade for a student.
//! dispatcher
//!     .notify_grade_added("10000001", "20000001", "Algorithmique")
//!     .unwrap();
//!
//! assert_eq!(dispatcher.unread_count("10000001").unwrap(), 1);
//!
//! // The student opens the notification.
//! let inbox = dispatcher.notifications_for("10000001").unwrap();
//! dispatcher.mark_read(&inbox[0].id).unwrap();
//! assert_eq!(dispatcher.unread_count("10000001").unwrap(), 0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod dispatcher;
mod mailbox;
mod memory_store;
mod notification;
mod query;
mod store;

pub use dispatcher::{NotificationDispatcher, NotificationObserver, Subscription};
pub use mailbox::{mailbox, Mailbox, MailboxObserver};
pub use memory_store::{InMemoryNotificationStore, InMemoryStoreConfig};
pub use notification::{Notification, NotificationId, NotificationKind, Priority};
pub use query::{since_days_ago, NotificationQuery, NotificationQueryBuilder};
pub use store::{
    NotificationStats, NotificationStore, NotifyError, NotifyResult, RECENT_WINDOW_DAYS,
};
