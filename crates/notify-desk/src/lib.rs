//! # campus-notify-desk
//!
//! The per-window half of the campus-suite notification subsystem: a
//! headless view-model ([`DeskEndpoint`]) that a window binds to one user
//! code and registers with the [`NotificationDispatcher`]. It keeps the
//! unread badge, the notification panel contents, and the active toasts;
//! the window's paint code only reads this state.
//!
//! # Example
//!
//! ```rust
//! use campus_notify::NotificationDispatcher;
//! use campus_notify_desk::DeskEndpoint;
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(NotificationDispatcher::new());
//! let endpoint = DeskEndpoint::new(dispatcher.clone(), "10000001");
//! let _subscription = dispatcher.subscribe(endpoint.clone());
//!
//! dispatcher
//!     .notify_grade_added("10000001", "20000001", "Algorithmique")
//!     .unwrap();
//!
//! assert_eq!(endpoint.badge(), 1);
//! assert_eq!(endpoint.active_toasts().len(), 1);
//! ```
//!
//! [`NotificationDispatcher`]: campus_notify::NotificationDispatcher

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod endpoint;
mod toast;

pub use endpoint::DeskEndpoint;
pub use toast::{Toast, TOAST_DURATION};
