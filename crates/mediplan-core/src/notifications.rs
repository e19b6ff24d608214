//! Auto-expiring notification queue.
//!
//! Each entry carries its own deadline. Expiry is evaluated against the
//! caller's clock on every read, so dismissing an entry early leaves nothing
//! behind to fire later.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{new_id, Notification, NotificationKind};

#[derive(Debug, Clone)]
pub struct NotificationQueue {
    ttl: chrono::Duration,
    entries: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
            entries: Vec::new(),
        }
    }

    /// Append a notification and return its id.
    pub fn push(&mut self, message: impl Into<String>, kind: NotificationKind, now: DateTime<Utc>) -> String {
        self.prune(now);
        let notification = Notification {
            id: new_id(),
            message: message.into(),
            kind,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let id = notification.id.clone();
        self.entries.push(notification);
        id
    }

    /// Remove by id. Unknown or already-expired ids are ignored.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != id);
        self.entries.len() != before
    }

    /// Notifications still live at `now`, in insertion order.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|n| !n.is_expired(now))
            .cloned()
            .collect()
    }

    /// Drop every entry whose deadline has passed.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|n| !n.is_expired(now));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_expires_after_ttl() {
        let mut queue = NotificationQueue::new(Duration::from_millis(4000));
        queue.push("Patient ajouté", NotificationKind::Success, t0());

        assert_eq!(queue.active(t0()).len(), 1);
        assert_eq!(queue.active(t0() + chrono::Duration::milliseconds(3999)).len(), 1);
        assert!(queue.active(t0() + chrono::Duration::milliseconds(4000)).is_empty());
    }

    #[test]
    fn test_dismiss_then_expiry_is_harmless() {
        let mut queue = NotificationQueue::new(Duration::from_millis(4000));
        let first = queue.push("RDV créé", NotificationKind::Success, t0());
        queue.push("Facture créée", NotificationKind::Success, t0());

        assert!(queue.dismiss(&first));
        assert!(!queue.dismiss(&first));

        let later = t0() + chrono::Duration::seconds(5);
        queue.prune(later);
        assert!(queue.active(later).is_empty());
        assert!(!queue.dismiss(&first));
    }

    #[test]
    fn test_insertion_order_without_dedup() {
        let mut queue = NotificationQueue::new(Duration::from_millis(4000));
        queue.push("A", NotificationKind::Info, t0());
        queue.push("A", NotificationKind::Info, t0());
        queue.push("B", NotificationKind::Warning, t0());

        let messages: Vec<String> = queue.active(t0()).into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["A", "A", "B"]);
    }
}
