//! Channel-backed observer for consumers on another thread or tick loop
//!
//! Direct observer callbacks run inside the dispatcher's `notify` call. A
//! consumer that must not run there (another thread, or a UI loop that
//! drains once per tick) registers a [`MailboxObserver`] instead; the
//! observer posts each notification into a channel, and the owning side
//! drains the [`Mailbox`] whenever it wants.

use crate::dispatcher::NotificationObserver;
use crate::notification::Notification;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Mutex;
use tracing::debug;

/// Create a connected observer/mailbox pair.
pub fn mailbox() -> (MailboxObserver, Mailbox) {
    let (sender, receiver) = mpsc::channel();
    (
        MailboxObserver { sender },
        Mailbox {
            receiver: Mutex::new(receiver),
        },
    )
}

/// The dispatcher-facing half: posts every received notification into the
/// channel. If the [`Mailbox`] has been dropped, posts become silent
/// no-ops.
pub struct MailboxObserver {
    sender: Sender<Notification>,
}

impl NotificationObserver for MailboxObserver {
    fn on_notification(&self, notification: &Notification) {
        if self.sender.send(notification.clone()).is_err() {
            debug!(id = %notification.id, "mailbox dropped, discarding notification");
        }
    }
}

/// The consumer-facing half: an inbox of notifications delivered since the
/// last drain.
pub struct Mailbox {
    receiver: Mutex<Receiver<Notification>>,
}

impl Mailbox {
    /// Take the next pending notification, if any.
    pub fn try_recv(&self) -> Option<Notification> {
        let receiver = match self.receiver.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match receiver.try_recv() {
            Ok(notification) => Some(notification),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take everything currently pending.
    pub fn drain(&self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Some(notification) = self.try_recv() {
            drained.push(notification);
        }
        drained
    }
}
