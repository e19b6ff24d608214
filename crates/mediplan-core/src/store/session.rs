//! Sign-in gate.
//!
//! The session is stored under its own key so signing out never touches the
//! domain collections.

use tracing::{debug, info};

use super::Store;
use crate::auth::{authenticate, hash_password, is_legacy_plaintext, AuthError};
use crate::db::StorageKey;
use crate::models::UserProfile;

impl Store {
    /// Check credentials and open a session.
    ///
    /// Legacy plaintext passwords are re-hashed on a successful sign-in.
    pub fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let profile = match authenticate(&self.users, email, password) {
            Ok(profile) => profile,
            Err(e) => {
                debug!("sign-in rejected");
                return Err(e);
            }
        };

        let mut keys = vec![StorageKey::Auth];
        if let Some(user) = self.users.iter_mut().find(|u| u.id == profile.id) {
            if is_legacy_plaintext(&user.password_hash) {
                user.password_hash = hash_password(password);
                keys.push(StorageKey::Users);
                info!(id = %user.id, "upgraded legacy password");
            }
        }

        self.session = Some(profile.clone());
        self.persist(&keys);
        Ok(profile)
    }

    /// Close the session. Only the session key is removed.
    pub fn logout(&mut self) {
        self.session = None;
        self.persistence.remove(StorageKey::Auth);
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StoreConfig;
    use crate::db::{KeyValueBackend, MemoryBackend};

    fn open(backend: &MemoryBackend) -> Store {
        let clock = ManualClock::on(NaiveDate::from_ymd_opt(2025, 1, 13).unwrap());
        Store::open(Box::new(backend.clone()), StoreConfig::default(), Arc::new(clock))
    }

    #[test]
    fn test_login_persists_profile_without_password() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend);

        let profile = store.login("admin@mediplan.ma", "admin123").unwrap();
        assert_eq!(profile.id, "u1");
        assert!(store.is_authenticated());

        let raw = backend.snapshot().get("mediplan_auth").cloned().unwrap();
        assert!(!raw.contains("password"));

        let reopened = open(&backend);
        assert_eq!(reopened.current_user().map(|u| u.id.as_str()), Some("u1"));
    }

    #[test]
    fn test_failures_share_message() {
        let mut store = open(&MemoryBackend::new());
        let wrong = store.login("admin@mediplan.ma", "nope").unwrap_err();
        let unknown = store.login("nobody@mediplan.ma", "admin123").unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_logout_keeps_domain_data() {
        let backend = MemoryBackend::new();
        let mut store = open(&backend);
        store.login("admin@mediplan.ma", "admin123").unwrap();
        let before = backend.snapshot();

        store.logout();

        let after = backend.snapshot();
        assert!(!after.contains_key("mediplan_auth"));
        assert_eq!(before.get("mediplan_patients"), after.get("mediplan_patients"));
        assert_eq!(after.len(), before.len() - 1);
    }

    #[test]
    fn test_legacy_password_is_upgraded() {
        let backend = MemoryBackend::new();
        backend.set("mediplan_initialized", "true").unwrap();
        backend
            .set(
                "mediplan_users",
                r#"[{"id":"u1","email":"admin@mediplan.ma","password":"admin123",
                    "name":"Dr. Fatima Alaoui","role":"admin","isActive":true}]"#,
            )
            .unwrap();

        let mut store = open(&backend);
        store.login("admin@mediplan.ma", "admin123").unwrap();

        let raw = backend.snapshot().get("mediplan_users").cloned().unwrap();
        assert!(!raw.contains("admin123"));
        store.logout();
        assert!(store.login("admin@mediplan.ma", "admin123").is_ok());
    }
}
