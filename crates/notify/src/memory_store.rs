//! In-memory notification store implementation

use super::notification::Notification;
use super::query::{since_days_ago, NotificationQuery};
use super::store::{
    NotificationStats, NotificationStore, NotifyError, NotifyResult, RECENT_WINDOW_DAYS,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Configuration for the in-memory notification store.
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    /// Maximum number of notifications to hold.
    pub max_entries: usize,
    /// Whether to drop the oldest notification when full (ring buffer
    /// behavior).
    pub evict_oldest: bool,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            evict_oldest: true,
        }
    }
}

/// In-memory notification store. Process-lifetime state only; a restart
/// loses all history.
pub struct InMemoryNotificationStore {
    entries: RwLock<Vec<Notification>>,
    next_seq: AtomicU64,
    config: InMemoryStoreConfig,
}

impl InMemoryNotificationStore {
    /// Create a store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(InMemoryStoreConfig::default())
    }

    /// Create a store with a custom configuration.
    pub fn with_config(config: InMemoryStoreConfig) -> Self {
        Self {
            entries: RwLock::new(Vec::with_capacity(config.max_entries.min(1000))),
            next_seq: AtomicU64::new(1),
            config,
        }
    }

    /// Create a bounded store holding at most `max_entries` notifications.
    pub fn bounded(max_entries: usize) -> Self {
        Self::with_config(InMemoryStoreConfig {
            max_entries,
            evict_oldest: true,
        })
    }
}

impl Default for InMemoryNotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn append(&self, mut notification: Notification) -> NotifyResult<Notification> {
        // The dispatcher checks too, but the store is the last line: a
        // record with no addressee must never land in the backing list.
        if notification.recipient.is_empty() {
            return Err(NotifyError::EmptyRecipient);
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| NotifyError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        if entries.len() >= self.config.max_entries {
            if self.config.evict_oldest {
                entries.remove(0);
            } else {
                return Err(NotifyError::StorageFull);
            }
        }

        notification.seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        entries.push(notification.clone());
        Ok(notification)
    }

    fn get(&self, recipient: &str, id: &str) -> NotifyResult<Option<Notification>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NotifyError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        Ok(entries
            .iter()
            .find(|n| n.recipient == recipient && n.id == id)
            .cloned())
    }

    fn fetch(&self, query: &NotificationQuery) -> NotifyResult<Vec<Notification>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NotifyError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        let mut results: Vec<Notification> = entries
            .iter()
            .filter(|n| query.matches(n))
            .cloned()
            .collect();

        // seq is the insertion order, so this stays exact even when two
        // notifications share a millisecond.
        if query.newest_first {
            results.sort_unstable_by(|a, b| b.seq.cmp(&a.seq));
        } else {
            results.sort_unstable_by(|a, b| a.seq.cmp(&b.seq));
        }

        let offset = query.offset.unwrap_or(0);
        let results: Vec<Notification> = match query.limit {
            Some(limit) => results.into_iter().skip(offset).take(limit).collect(),
            None => results.into_iter().skip(offset).collect(),
        };

        Ok(results)
    }

    fn count(&self, query: &NotificationQuery) -> NotifyResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NotifyError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        Ok(entries.iter().filter(|n| query.matches(n)).count())
    }

    fn unread_count(&self, recipient: &str) -> NotifyResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NotifyError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        Ok(entries
            .iter()
            .filter(|n| n.recipient == recipient && !n.read)
            .count())
    }

    fn mark_read(&self, id: &str) -> NotifyResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NotifyError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        match entries.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.read => {
                n.read = true;
                Ok(true)
            }
            // Already read or unknown id: a no-op, never an error.
            _ => Ok(false),
        }
    }

    fn mark_all_read(&self, recipient: &str) -> NotifyResult<usize> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NotifyError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        let mut flipped = 0;
        for n in entries.iter_mut() {
            if n.recipient == recipient && !n.read {
                n.read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    fn delete(&self, recipient: &str, id: &str) -> NotifyResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NotifyError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        // Recipient-scoped lookup: an id collision can never remove another
        // user's notification.
        match entries
            .iter()
            .position(|n| n.recipient == recipient && n.id == id)
        {
            Some(idx) => {
                entries.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_all(&self, recipient: &str) -> NotifyResult<usize> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NotifyError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        let before = entries.len();
        entries.retain(|n| n.recipient != recipient);
        Ok(before - entries.len())
    }

    fn stats(&self, recipient: &str) -> NotifyResult<NotificationStats> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NotifyError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        let window_start = since_days_ago(RECENT_WINDOW_DAYS);
        let mut stats = NotificationStats {
            total: 0,
            unread: 0,
            recent: 0,
        };
        for n in entries.iter().filter(|n| n.recipient == recipient) {
            stats.total += 1;
            if !n.read {
                stats.unread += 1;
            }
            if n.timestamp >= window_start {
                stats.recent += 1;
            }
        }
        Ok(stats)
    }

    fn total_count(&self) -> NotifyResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| NotifyError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        Ok(entries.len())
    }

    fn clear(&self) -> NotifyResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| NotifyError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;

    #[test]
    fn test_append_and_get() {
        let store = InMemoryNotificationStore::new();

        let n = Notification::new(NotificationKind::GradeAdded, "10000001")
            .sender("20000001")
            .title("Note ajoutée");
        let stored = store.append(n).unwrap();

        let found = store.get("10000001", &stored.id).unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().sender, "20000001");

        // Lookup is recipient-scoped.
        let other = store.get("10000002", &stored.id).unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_append_rejects_empty_recipient() {
        let store = InMemoryNotificationStore::new();

        let err = store
            .append(Notification::new(NotificationKind::Announcement, ""))
            .unwrap_err();
        assert!(matches!(err, NotifyError::EmptyRecipient));

        // Nothing landed in the backing list.
        assert_eq!(store.total_count().unwrap(), 0);
        assert_eq!(store.unread_count("").unwrap(), 0);
    }

    #[test]
    fn test_fetch_newest_first() {
        let store = InMemoryNotificationStore::new();

        let a = store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        let b = store
            .append(Notification::new(NotificationKind::GradeUpdated, "10000001"))
            .unwrap();

        let results = store.query().recipient("10000001").fetch().unwrap();
        assert_eq!(results.len(), 2);
        // B was created after A, so B comes first.
        assert_eq!(results[0].id, b.id);
        assert_eq!(results[1].id, a.id);
    }

    #[test]
    fn test_mark_read_idempotent() {
        let store = InMemoryNotificationStore::new();
        let n = store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();

        assert_eq!(store.unread_count("10000001").unwrap(), 1);
        assert!(store.mark_read(&n.id).unwrap());
        assert_eq!(store.unread_count("10000001").unwrap(), 0);

        // Second call is a no-op.
        assert!(!store.mark_read(&n.id).unwrap());
        assert_eq!(store.unread_count("10000001").unwrap(), 0);

        // Unknown id is a no-op, not an error.
        assert!(!store.mark_read("no-such-id").unwrap());
    }

    #[test]
    fn test_mark_all_read_scoped_to_recipient() {
        let store = InMemoryNotificationStore::new();
        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000002"))
            .unwrap();

        assert_eq!(store.mark_all_read("10000001").unwrap(), 2);
        assert_eq!(store.unread_count("10000001").unwrap(), 0);
        assert_eq!(store.unread_count("10000002").unwrap(), 1);
    }

    #[test]
    fn test_delete_scoped_and_idempotent() {
        let store = InMemoryNotificationStore::new();
        let n = store
            .append(Notification::new(NotificationKind::AbsenceRecorded, "10000001"))
            .unwrap();

        // Another user cannot delete it.
        assert!(!store.delete("10000002", &n.id).unwrap());
        assert_eq!(store.total_count().unwrap(), 1);

        assert!(store.delete("10000001", &n.id).unwrap());
        assert!(store
            .query()
            .recipient("10000001")
            .fetch()
            .unwrap()
            .is_empty());

        // Second delete is a no-op.
        assert!(!store.delete("10000001", &n.id).unwrap());
    }

    #[test]
    fn test_delete_all() {
        let store = InMemoryNotificationStore::new();
        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000002"))
            .unwrap();

        assert_eq!(store.delete_all("10000001").unwrap(), 2);
        assert_eq!(store.total_count().unwrap(), 1);
        assert_eq!(store.delete_all("10000001").unwrap(), 0);
    }

    #[test]
    fn test_stats() {
        let store = InMemoryNotificationStore::new();
        let a = store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        store
            .append(Notification::new(NotificationKind::AbsenceRecorded, "10000001"))
            .unwrap();
        store.mark_read(&a.id).unwrap();

        let stats = store.stats("10000001").unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.unread, 1);
        assert_eq!(stats.recent, 2);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let store = InMemoryNotificationStore::bounded(3);

        let first = store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        for _ in 0..3 {
            store
                .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
                .unwrap();
        }

        assert_eq!(store.total_count().unwrap(), 3);
        assert!(store.get("10000001", &first.id).unwrap().is_none());
    }

    #[test]
    fn test_bounded_without_eviction_reports_full() {
        let store = InMemoryNotificationStore::with_config(InMemoryStoreConfig {
            max_entries: 1,
            evict_oldest: false,
        });

        store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap();
        let err = store
            .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
            .unwrap_err();
        assert!(matches!(err, NotifyError::StorageFull));
    }

    #[test]
    fn test_pagination() {
        let store = InMemoryNotificationStore::new();
        for _ in 0..10 {
            store
                .append(Notification::new(NotificationKind::GradeAdded, "10000001"))
                .unwrap();
        }

        let page1 = store
            .query()
            .recipient("10000001")
            .limit(3)
            .offset(0)
            .fetch()
            .unwrap();
        let page2 = store
            .query()
            .recipient("10000001")
            .limit(3)
            .offset(3)
            .fetch()
            .unwrap();

        assert_eq!(page1.len(), 3);
        assert_eq!(page2.len(), 3);
        assert_ne!(page1[0].id, page2[0].id);
    }
}
