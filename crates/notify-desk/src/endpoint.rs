//! Per-window observer endpoint

use crate::toast::Toast;
use campus_notify::{
    Notification, NotificationDispatcher, NotificationObserver, NotifyResult,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::warn;

#[derive(Default)]
struct EndpointState {
    badge: usize,
    panel_open: bool,
    panel: Vec<Notification>,
    toasts: Vec<Toast>,
}

/// View-model of one window's notification surface: the unread badge, the
/// notification panel, and the active toasts.
///
/// The endpoint is the bridge between the dispatcher's push delivery and
/// one window. It self-filters on its bound user code; the dispatcher sends
/// it everything. After a matching push it refreshes the badge by pulling
/// [`NotificationDispatcher::unread_count`] fresh rather than trusting the
/// pushed record alone, since several notifications may have arrived.
///
/// Wiring: build the endpoint, then hold the handle from
/// `dispatcher.subscribe(endpoint.clone())` for the window's lifetime.
pub struct DeskEndpoint {
    user: String,
    dispatcher: Arc<NotificationDispatcher>,
    state: Mutex<EndpointState>,
}

impl DeskEndpoint {
    /// Create an endpoint bound to one user code. The badge starts at the
    /// store's current unread count.
    pub fn new(dispatcher: Arc<NotificationDispatcher>, user: impl Into<String>) -> Arc<Self> {
        let endpoint = Arc::new(Self {
            user: user.into(),
            dispatcher,
            state: Mutex::new(EndpointState::default()),
        });
        if let Err(e) = endpoint.refresh_badge() {
            warn!(user = %endpoint.user, error = %e, "initial badge refresh failed");
        }
        endpoint
    }

    /// The user code this endpoint is bound to.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Current unread badge value.
    pub fn badge(&self) -> usize {
        self.lock_state().badge
    }

    /// Re-pull the unread count from the dispatcher.
    pub fn refresh_badge(&self) -> NotifyResult<usize> {
        let count = self.dispatcher.unread_count(&self.user)?;
        self.lock_state().badge = count;
        Ok(count)
    }

    // --- panel ---

    /// Open the notification panel, loading entries most recent first.
    pub fn open_panel(&self) -> NotifyResult<Vec<Notification>> {
        let entries = self.dispatcher.notifications_for(&self.user)?;
        let mut state = self.lock_state();
        state.panel_open = true;
        state.panel = entries.clone();
        Ok(entries)
    }

    /// Close the panel, dropping its loaded entries.
    pub fn close_panel(&self) {
        let mut state = self.lock_state();
        state.panel_open = false;
        state.panel.clear();
    }

    /// Whether the panel is currently open.
    pub fn is_panel_open(&self) -> bool {
        self.lock_state().panel_open
    }

    /// The entries currently shown in the panel.
    pub fn panel_entries(&self) -> Vec<Notification> {
        self.lock_state().panel.clone()
    }

    /// The user clicked one panel entry: mark it read and refresh.
    pub fn click_entry(&self, id: &str) -> NotifyResult<()> {
        self.dispatcher.mark_read(id)?;
        self.refresh()
    }

    /// Mark everything read and refresh. Returns how many were flipped.
    pub fn mark_all_read(&self) -> NotifyResult<usize> {
        let flipped = self.dispatcher.mark_all_read(&self.user)?;
        self.refresh()?;
        Ok(flipped)
    }

    /// Delete one entry and refresh. Returns whether it existed.
    pub fn delete_entry(&self, id: &str) -> NotifyResult<bool> {
        let existed = self.dispatcher.delete(&self.user, id)?;
        self.refresh()?;
        Ok(existed)
    }

    /// Delete every notification of this user and refresh.
    pub fn clear_all(&self) -> NotifyResult<usize> {
        let removed = self.dispatcher.delete_all(&self.user)?;
        self.refresh()?;
        Ok(removed)
    }

    // --- toasts ---

    /// Toasts currently on screen.
    pub fn active_toasts(&self) -> Vec<Toast> {
        self.lock_state().toasts.clone()
    }

    /// Advance the toast clock: expire every toast whose deadline has
    /// passed at `now`. Returns the expired toasts.
    pub fn tick(&self, now: Instant) -> Vec<Toast> {
        let mut state = self.lock_state();
        let (expired, live): (Vec<Toast>, Vec<Toast>) = state
            .toasts
            .drain(..)
            .partition(|toast| toast.is_expired(now));
        state.toasts = live;
        expired
    }

    /// The user dismissed a toast early. Returns whether it was showing.
    pub fn dismiss_toast(&self, notification_id: &str) -> bool {
        let mut state = self.lock_state();
        let before = state.toasts.len();
        state
            .toasts
            .retain(|toast| toast.notification.id != notification_id);
        state.toasts.len() < before
    }

    fn refresh(&self) -> NotifyResult<()> {
        let count = self.dispatcher.unread_count(&self.user)?;
        // One guard for the open check and the write, so a concurrent
        // close_panel cannot leave stale entries in a closed panel.
        let mut state = self.lock_state();
        state.badge = count;
        if state.panel_open {
            state.panel = self.dispatcher.notifications_for(&self.user)?;
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, EndpointState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl NotificationObserver for DeskEndpoint {
    fn on_notification(&self, notification: &Notification) {
        // Every observer sees every event; relevance is decided here.
        if notification.recipient != self.user {
            return;
        }

        if let Err(e) = self.refresh() {
            warn!(user = %self.user, error = %e, "refresh after delivery failed");
        }

        let toast = Toast::new(notification.clone(), Instant::now());
        self.lock_state().toasts.push(toast);
    }
}
