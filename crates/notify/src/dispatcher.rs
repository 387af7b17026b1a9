//! Notification dispatcher: creation entry point, observer registry, and
//! synchronous fan-out
//!
//! One dispatcher exists per process. It is constructed explicitly at
//! startup and handed (behind an [`Arc`]) to every window or controller
//! that needs it; there is no global accessor.

use crate::memory_store::InMemoryNotificationStore;
use crate::notification::{Notification, NotificationKind, Priority};
use crate::query::NotificationQueryBuilder;
use crate::store::{NotificationStats, NotificationStore, NotifyError, NotifyResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, warn};

/// Callback interface for live notification delivery.
///
/// Every registered observer sees every notification; the dispatcher does
/// no recipient filtering. An observer compares the record's `recipient` to
/// its own bound user code and ignores everything else.
pub trait NotificationObserver: Send + Sync {
    /// Called synchronously, in registration order, for each notification
    /// created through [`NotificationDispatcher::notify`].
    fn on_notification(&self, notification: &Notification);
}

struct Registered {
    token: u64,
    observer: Arc<dyn NotificationObserver>,
}

/// Owner of the notification store and the observer registry.
///
/// Creation fans out synchronously: by the time [`notify`] returns, every
/// registered observer has already been invoked. Read-state changes
/// (`mark_read`, `delete`, ...) deliberately do not fan out; endpoints pull
/// fresh counts instead.
///
/// [`notify`]: NotificationDispatcher::notify
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    observers: Mutex<Vec<Registered>>,
    next_token: AtomicU64,
}

impl NotificationDispatcher {
    /// Create a dispatcher over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryNotificationStore::new()))
    }

    /// Create a dispatcher over an existing store.
    pub fn with_store(store: Arc<dyn NotificationStore>) -> Self {
        Self {
            store,
            observers: Mutex::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Create and deliver a notification.
    ///
    /// The record is appended to the store, then every registered observer
    /// is invoked in registration order before this returns. The recipient
    /// is not validated against any user directory; any non-empty code is
    /// accepted.
    pub fn notify(
        &self,
        recipient: impl Into<String>,
        sender: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
    ) -> NotifyResult<Notification> {
        let recipient = recipient.into();
        if recipient.is_empty() {
            return Err(NotifyError::EmptyRecipient);
        }

        let notification = Notification::new(kind, recipient)
            .sender(sender)
            .title(title)
            .message(message)
            .priority(priority);
        let stored = self.store.append(notification)?;

        debug!(
            id = %stored.id,
            kind = %stored.kind,
            recipient = %stored.recipient,
            "notification created"
        );

        // Snapshot under the lock, invoke outside it, so a callback that
        // itself registers or notifies cannot deadlock. An observer
        // registered more than once is delivered to once, at its earliest
        // registration position.
        let snapshot: Vec<Arc<dyn NotificationObserver>> = {
            let observers = self.lock_observers();
            let mut seen: Vec<*const ()> = Vec::with_capacity(observers.len());
            let mut snapshot = Vec::with_capacity(observers.len());
            for registered in observers.iter() {
                let ptr = observer_ptr(&registered.observer);
                if !seen.contains(&ptr) {
                    seen.push(ptr);
                    snapshot.push(registered.observer.clone());
                }
            }
            snapshot
        };
        for observer in snapshot {
            observer.on_notification(&stored);
        }

        Ok(stored)
    }

    /// Register an observer for live delivery.
    ///
    /// Registration has set semantics: adding an observer that is already
    /// registered does not create a second delivery.
    pub fn add_observer(&self, observer: Arc<dyn NotificationObserver>) {
        let mut observers = self.lock_observers();
        if observers
            .iter()
            .any(|r| Arc::ptr_eq(&r.observer, &observer))
        {
            return;
        }
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        observers.push(Registered { token, observer });
    }

    /// Remove a single registration of the given observer.
    pub fn remove_observer(&self, observer: &Arc<dyn NotificationObserver>) {
        let mut observers = self.lock_observers();
        match observers
            .iter()
            .position(|r| Arc::ptr_eq(&r.observer, observer))
        {
            Some(idx) => {
                observers.remove(idx);
            }
            None => warn!("attempted to remove an observer that is not registered"),
        }
    }

    /// Register an observer and get a handle that unregisters it on drop.
    ///
    /// This is the preferred lifecycle integration for windows: hold the
    /// [`Subscription`] for the window's lifetime and the observer can
    /// never leak past it, even on abnormal teardown. Every call creates
    /// its own registration: an observer subscribed twice stays registered
    /// until its last handle is dropped, and fan-out still delivers to it
    /// only once per event.
    pub fn subscribe(
        self: &Arc<Self>,
        observer: Arc<dyn NotificationObserver>,
    ) -> Subscription {
        let token = {
            let mut observers = self.lock_observers();
            let token = self.next_token.fetch_add(1, Ordering::SeqCst);
            observers.push(Registered { token, observer });
            token
        };
        Subscription {
            dispatcher: Arc::downgrade(self),
            token,
        }
    }

    /// Number of distinct observers currently registered.
    pub fn observer_count(&self) -> usize {
        let observers = self.lock_observers();
        let mut seen: Vec<*const ()> = Vec::with_capacity(observers.len());
        for registered in observers.iter() {
            let ptr = observer_ptr(&registered.observer);
            if !seen.contains(&ptr) {
                seen.push(ptr);
            }
        }
        seen.len()
    }

    fn remove_token(&self, token: u64) {
        let mut observers = self.lock_observers();
        observers.retain(|r| r.token != token);
    }

    fn lock_observers(&self) -> std::sync::MutexGuard<'_, Vec<Registered>> {
        // A poisoned registry lock means an observer callback panicked; the
        // registry itself is still a plain Vec, so keep going.
        match self.observers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // --- convenience creation for the collaborator flows ---

    /// A grade was recorded for a student.
    pub fn notify_grade_added(
        &self,
        student: &str,
        professor: &str,
        module: &str,
    ) -> NotifyResult<Notification> {
        self.notify(
            student,
            professor,
            NotificationKind::GradeAdded,
            "Note ajoutée",
            format!("Une note a été ajoutée pour le module {}.", module),
            Priority::Normal,
        )
    }

    /// An existing grade was changed.
    pub fn notify_grade_updated(
        &self,
        student: &str,
        professor: &str,
        module: &str,
    ) -> NotifyResult<Notification> {
        self.notify(
            student,
            professor,
            NotificationKind::GradeUpdated,
            "Note modifiée",
            format!("La note du module {} a été modifiée.", module),
            Priority::Normal,
        )
    }

    /// An absence was recorded for a student.
    pub fn notify_absence_recorded(
        &self,
        student: &str,
        professor: &str,
        module: &str,
    ) -> NotifyResult<Notification> {
        self.notify(
            student,
            professor,
            NotificationKind::AbsenceRecorded,
            "Absence enregistrée",
            format!("Une absence a été enregistrée pour le module {}.", module),
            Priority::Normal,
        )
    }

    /// A module was assigned to a professor.
    pub fn notify_module_assigned(
        &self,
        professor: &str,
        vice_dean: &str,
        module: &str,
    ) -> NotifyResult<Notification> {
        self.notify(
            professor,
            vice_dean,
            NotificationKind::ModuleAssigned,
            "Module assigné",
            format!("Le module {} vous a été assigné.", module),
            Priority::Normal,
        )
    }

    /// A user account was created.
    pub fn notify_account_created(&self, user: &str, admin: &str) -> NotifyResult<Notification> {
        self.notify(
            user,
            admin,
            NotificationKind::AccountCreated,
            "Compte créé",
            "Votre compte a été créé.",
            Priority::Normal,
        )
    }

    /// A user account was modified.
    pub fn notify_account_updated(&self, user: &str, admin: &str) -> NotifyResult<Notification> {
        self.notify(
            user,
            admin,
            NotificationKind::AccountUpdated,
            "Compte modifié",
            "Votre compte a été modifié.",
            Priority::Normal,
        )
    }

    /// A student inscription was validated.
    pub fn notify_inscription_validated(
        &self,
        student: &str,
        vice_dean: &str,
    ) -> NotifyResult<Notification> {
        self.notify(
            student,
            vice_dean,
            NotificationKind::InscriptionValidated,
            "Inscription validée",
            "Votre inscription a été validée.",
            Priority::Normal,
        )
    }

    /// A password was reset. Sender may equal recipient for self-service
    /// resets.
    pub fn notify_password_reset(&self, user: &str, sender: &str) -> NotifyResult<Notification> {
        self.notify(
            user,
            sender,
            NotificationKind::PasswordReset,
            "Mot de passe réinitialisé",
            "Votre mot de passe a été réinitialisé.",
            Priority::Normal,
        )
    }

    /// A system announcement, delivered urgent.
    pub fn announce(
        &self,
        recipient: &str,
        sender: &str,
        title: &str,
        message: &str,
    ) -> NotifyResult<Notification> {
        self.notify(
            recipient,
            sender,
            NotificationKind::Announcement,
            title,
            message,
            Priority::Urgent,
        )
    }

    // --- recipient-scoped queries and mutations ---

    /// All notifications for a user, most recent first.
    pub fn notifications_for(&self, user: &str) -> NotifyResult<Vec<Notification>> {
        self.query().recipient(user).fetch()
    }

    /// Unread notifications for a user, most recent first.
    pub fn unread_for(&self, user: &str) -> NotifyResult<Vec<Notification>> {
        self.query().recipient(user).unread_only().fetch()
    }

    /// Notifications for a user from the last `days` days.
    pub fn recent_for(&self, user: &str, days: u64) -> NotifyResult<Vec<Notification>> {
        self.query().recipient(user).recent(days).fetch()
    }

    /// Notifications of one kind for a user.
    pub fn by_kind_for(
        &self,
        user: &str,
        kind: NotificationKind,
    ) -> NotifyResult<Vec<Notification>> {
        self.query().recipient(user).kind(kind).fetch()
    }

    /// Count of unread notifications for a user.
    pub fn unread_count(&self, user: &str) -> NotifyResult<usize> {
        self.store.unread_count(user)
    }

    /// Aggregate counts for a user.
    pub fn stats(&self, user: &str) -> NotifyResult<NotificationStats> {
        self.store.stats(user)
    }

    /// Mark one notification read. Idempotent; does not fan out.
    pub fn mark_read(&self, id: &str) -> NotifyResult<bool> {
        self.store.mark_read(id)
    }

    /// Mark every notification of a user read. Does not fan out.
    pub fn mark_all_read(&self, user: &str) -> NotifyResult<usize> {
        self.store.mark_all_read(user)
    }

    /// Delete one notification of a user. Second delete is a no-op.
    pub fn delete(&self, user: &str, id: &str) -> NotifyResult<bool> {
        self.store.delete(user, id)
    }

    /// Delete every notification of a user.
    pub fn delete_all(&self, user: &str) -> NotifyResult<usize> {
        self.store.delete_all(user)
    }

    /// Start an arbitrary query against the backing store.
    pub fn query(&self) -> NotificationQueryBuilder<'_> {
        NotificationQueryBuilder::new(&*self.store)
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of an observer: the data pointer, metadata stripped, so two
/// registrations of the same object compare equal regardless of how the
/// `Arc` was coerced.
fn observer_ptr(observer: &Arc<dyn NotificationObserver>) -> *const () {
    Arc::as_ptr(observer) as *const ()
}

/// Handle for a live observer registration.
///
/// Dropping the handle unregisters the observer. If the dispatcher is
/// already gone, dropping is a no-op.
#[must_use = "dropping the subscription unregisters the observer"]
pub struct Subscription {
    dispatcher: Weak<NotificationDispatcher>,
    token: u64,
}

impl Subscription {
    /// Unregister explicitly. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.remove_token(self.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Notification>>,
    }

    impl Recorder {
        fn ids(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|n| n.id.clone()).collect()
        }
    }

    impl NotificationObserver for Recorder {
        fn on_notification(&self, notification: &Notification) {
            self.seen.lock().unwrap().push(notification.clone());
        }
    }

    #[test]
    fn test_notify_stores_and_returns_record() {
        let dispatcher = NotificationDispatcher::new();

        let n = dispatcher
            .notify(
                "10000001",
                "20000001",
                NotificationKind::GradeAdded,
                "Note ajoutée",
                "Une note a été ajoutée pour le module Algorithmique.",
                Priority::Normal,
            )
            .unwrap();

        assert!(n.seq > 0);
        assert_eq!(dispatcher.unread_count("10000001").unwrap(), 1);
        let all = dispatcher.notifications_for("10000001").unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, n.id);
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let dispatcher = NotificationDispatcher::new();
        let err = dispatcher
            .notify(
                "",
                "20000001",
                NotificationKind::Announcement,
                "t",
                "m",
                Priority::Normal,
            )
            .unwrap_err();
        assert!(matches!(err, NotifyError::EmptyRecipient));
    }

    #[test]
    fn test_unknown_recipient_still_stored() {
        // The dispatcher does not validate user existence.
        let dispatcher = NotificationDispatcher::new();
        dispatcher
            .notify_grade_added("99999999", "20000001", "Analyse")
            .unwrap();
        assert_eq!(dispatcher.unread_count("99999999").unwrap(), 1);
    }

    #[test]
    fn test_fanout_reaches_every_observer_once() {
        let dispatcher = NotificationDispatcher::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        dispatcher.add_observer(a.clone());
        dispatcher.add_observer(b.clone());

        let n = dispatcher
            .notify_grade_added("10000001", "20000001", "Algorithmique")
            .unwrap();

        // No dispatcher-side filtering: both observers see the event,
        // exactly once each.
        assert_eq!(a.ids(), vec![n.id.clone()]);
        assert_eq!(b.ids(), vec![n.id]);
    }

    #[test]
    fn test_double_add_delivers_once() {
        let dispatcher = NotificationDispatcher::new();
        let a = Arc::new(Recorder::default());
        dispatcher.add_observer(a.clone());
        dispatcher.add_observer(a.clone());
        assert_eq!(dispatcher.observer_count(), 1);

        dispatcher
            .notify_absence_recorded("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 1);
    }

    #[test]
    fn test_removed_observer_receives_nothing() {
        let dispatcher = NotificationDispatcher::new();
        let a = Arc::new(Recorder::default());
        let a_dyn: Arc<dyn NotificationObserver> = a.clone();
        dispatcher.add_observer(a_dyn.clone());
        dispatcher.remove_observer(&a_dyn);

        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert!(a.ids().is_empty());
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let dispatcher = Arc::new(NotificationDispatcher::new());
        let a = Arc::new(Recorder::default());

        let subscription = dispatcher.subscribe(a.clone());
        assert_eq!(dispatcher.observer_count(), 1);
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 1);

        drop(subscription);
        assert_eq!(dispatcher.observer_count(), 0);
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 1);
    }

    #[test]
    fn test_each_subscription_owns_its_registration() {
        let dispatcher = Arc::new(NotificationDispatcher::new());
        let a = Arc::new(Recorder::default());

        let first = dispatcher.subscribe(a.clone());
        let second = dispatcher.subscribe(a.clone());
        assert_eq!(dispatcher.observer_count(), 1);

        // Double registration still delivers once per event.
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 1);

        // Dropping one handle leaves the other registration live.
        drop(first);
        assert_eq!(dispatcher.observer_count(), 1);
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 2);

        drop(second);
        assert_eq!(dispatcher.observer_count(), 0);
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 2);
    }

    #[test]
    fn test_subscription_drop_leaves_explicit_registration() {
        let dispatcher = Arc::new(NotificationDispatcher::new());
        let a = Arc::new(Recorder::default());
        let a_dyn: Arc<dyn NotificationObserver> = a.clone();

        dispatcher.add_observer(a_dyn.clone());
        let sub = dispatcher.subscribe(a_dyn.clone());
        drop(sub);

        // The explicit registration survives the dropped handle.
        assert_eq!(dispatcher.observer_count(), 1);
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 1);

        dispatcher.remove_observer(&a_dyn);
        assert_eq!(dispatcher.observer_count(), 0);
    }

    #[test]
    fn test_mark_read_does_not_fan_out() {
        let dispatcher = NotificationDispatcher::new();
        let a = Arc::new(Recorder::default());
        dispatcher.add_observer(a.clone());

        let n = dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        assert_eq!(a.ids().len(), 1);

        // Read-state changes are pull-model: no second callback.
        assert!(dispatcher.mark_read(&n.id).unwrap());
        assert_eq!(a.ids().len(), 1);
    }

    #[test]
    fn test_mark_all_read_leaves_other_users_untouched() {
        let dispatcher = NotificationDispatcher::new();
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        dispatcher
            .notify_grade_added("10000002", "20000001", "Analyse")
            .unwrap();

        assert_eq!(dispatcher.mark_all_read("10000001").unwrap(), 1);
        assert_eq!(dispatcher.unread_count("10000001").unwrap(), 0);
        assert_eq!(dispatcher.unread_count("10000002").unwrap(), 1);
    }

    #[test]
    fn test_announcement_is_urgent() {
        let dispatcher = NotificationDispatcher::new();
        let n = dispatcher
            .announce("10000001", "30000001", "Fermeture", "Campus fermé vendredi.")
            .unwrap();
        assert_eq!(n.priority, Priority::Urgent);
        assert_eq!(n.kind, NotificationKind::Announcement);
    }

    #[test]
    fn test_by_kind_filter() {
        let dispatcher = NotificationDispatcher::new();
        dispatcher
            .notify_grade_added("10000001", "20000001", "Analyse")
            .unwrap();
        dispatcher
            .notify_absence_recorded("10000001", "20000001", "Analyse")
            .unwrap();

        let grades = dispatcher
            .by_kind_for("10000001", NotificationKind::GradeAdded)
            .unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].kind, NotificationKind::GradeAdded);
    }
}
