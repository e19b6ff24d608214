//! The clinic store.
//!
//! Holds every collection in memory and mirrors each change to a
//! [`Persistence`] adapter. Operations are split across submodules, one per
//! entity or feature, all as `impl Store` blocks.

mod appointments;
mod cabinet;
mod invoices;
mod patients;
mod payments;
mod queries;
mod records;
mod reminders;
mod session;
mod stats;
mod users;

pub use queries::InvoiceTotals;
pub use reminders::{format_reminder_message, should_send_reminder, ReminderData};
pub use stats::Stats;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::db::{
    encode, KeyValueBackend, MemoryBackend, Persistence, Slot, SqliteBackend, StorageError,
    StorageKey,
};
use crate::models::*;
use crate::notifications::NotificationQueue;
use crate::validation::ValidationErrors;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    ProtectedUser(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// In-memory clinic database with best-effort persistence.
pub struct Store {
    persistence: Persistence,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    medical_records: Vec<MedicalRecord>,
    invoices: Vec<Invoice>,
    users: Vec<User>,
    cabinet: CabinetConfig,
    session: Option<UserProfile>,
    notifications: NotificationQueue,
    /// Stored elements that did not decode, written back unchanged.
    rejected: HashMap<StorageKey, Vec<Value>>,
    /// Slots that exist but could not be read. Never overwritten.
    unreadable: HashSet<StorageKey>,
}

impl Store {
    /// Open a store over `backend`, loading persisted state.
    ///
    /// On first open the collections are seeded (demo data or empty, per
    /// `config.seed_demo_data`) and written back in one batch before the
    /// `initialized` marker is set.
    pub fn open(backend: Box<dyn KeyValueBackend>, config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let persistence = Persistence::new(backend, config.tenant_prefix.clone());
        let notifications = NotificationQueue::new(config.notification_ttl());

        let mut store = Self {
            persistence,
            config,
            clock,
            patients: Vec::new(),
            appointments: Vec::new(),
            medical_records: Vec::new(),
            invoices: Vec::new(),
            users: Vec::new(),
            cabinet: CabinetConfig::default(),
            session: None,
            notifications,
            rejected: HashMap::new(),
            unreadable: HashSet::new(),
        };
        store.load();
        store
    }

    /// Open a store backed by an SQLite file.
    pub fn open_sqlite(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let backend = SqliteBackend::open(path)?;
        Ok(Self::open(Box::new(backend), config, Arc::new(SystemClock)))
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory(config: StoreConfig) -> Self {
        Self::open(Box::new(MemoryBackend::new()), config, Arc::new(SystemClock))
    }

    fn load(&mut self) {
        self.session = self.persistence.load_optional(StorageKey::Auth);

        if !self.persistence.is_initialized() {
            let data = self.initial_data();
            info!(
                prefix = self.persistence.prefix(),
                patients = data.patients.len(),
                users = data.users.len(),
                "seeding new store"
            );
            self.install(data);
            self.persist(&StorageKey::COLLECTIONS);
            self.persistence.mark_initialized();
            return;
        }

        // Fallbacks are only built if a slot is missing or unreadable.
        let mut fallback: Option<DemoData> = None;
        let seed = self.config.seed_demo_data;
        let mut fallback_data = || {
            fallback
                .get_or_insert_with(|| if seed { DemoData::seed() } else { DemoData::blank() })
                .clone()
        };

        self.patients = self
            .load_list(StorageKey::Patients)
            .unwrap_or_else(|| fallback_data().patients);
        self.appointments = self
            .load_list(StorageKey::Appointments)
            .unwrap_or_else(|| fallback_data().appointments);
        self.medical_records = self
            .load_list(StorageKey::MedicalRecords)
            .unwrap_or_else(|| fallback_data().medical_records);
        self.invoices = self
            .load_list(StorageKey::Invoices)
            .unwrap_or_else(|| fallback_data().invoices);
        self.users = self
            .load_list(StorageKey::Users)
            .unwrap_or_else(|| fallback_data().users);
        self.cabinet = match self.persistence.read(StorageKey::Cabinet) {
            Slot::Present(cabinet) => cabinet,
            Slot::Missing => CabinetConfig::default(),
            Slot::Unreadable => {
                self.unreadable.insert(StorageKey::Cabinet);
                CabinetConfig::default()
            }
        };
    }

    fn load_list<T: DeserializeOwned>(&mut self, key: StorageKey) -> Option<Vec<T>> {
        match self.persistence.read_list(key) {
            Slot::Present(decoded) => {
                if !decoded.rejected.is_empty() {
                    self.rejected.insert(key, decoded.rejected);
                }
                Some(decoded.items)
            }
            Slot::Missing => None,
            Slot::Unreadable => {
                self.unreadable.insert(key);
                None
            }
        }
    }

    fn initial_data(&self) -> DemoData {
        if self.config.seed_demo_data {
            DemoData::seed()
        } else {
            DemoData::blank()
        }
    }

    fn install(&mut self, data: DemoData) {
        self.patients = data.patients;
        self.appointments = data.appointments;
        self.medical_records = data.medical_records;
        self.invoices = data.invoices;
        self.users = data.users;
        self.cabinet = data.cabinet;
    }

    /// Write the given collections in one atomic batch.
    ///
    /// Slots that were unreadable at load time are left as stored; changes
    /// to them stay in memory only.
    fn persist(&self, keys: &[StorageKey]) {
        let entries: Vec<(StorageKey, String)> = keys
            .iter()
            .filter(|key| {
                let writable = !self.unreadable.contains(*key);
                if !writable {
                    error!(key = key.suffix(), "unreadable slot not overwritten, change kept in memory");
                }
                writable
            })
            .filter_map(|key| self.encoded(*key).map(|value| (*key, value)))
            .collect();
        self.persistence.save_all(entries);
    }

    fn encoded(&self, key: StorageKey) -> Option<String> {
        match key {
            StorageKey::Patients => self.encode_list(key, &self.patients),
            StorageKey::Appointments => self.encode_list(key, &self.appointments),
            StorageKey::MedicalRecords => self.encode_list(key, &self.medical_records),
            StorageKey::Invoices => self.encode_list(key, &self.invoices),
            StorageKey::Users => self.encode_list(key, &self.users),
            StorageKey::Cabinet => encode(key, &self.cabinet),
            StorageKey::Auth => self.session.as_ref().and_then(|s| encode(key, s)),
            StorageKey::Initialized => None,
        }
    }

    /// Encode a collection followed by its rejected raw elements.
    fn encode_list<T: Serialize>(&self, key: StorageKey, items: &[T]) -> Option<String> {
        let Some(rejected) = self.rejected.get(&key) else {
            return encode(key, items);
        };
        let mut values = match items.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>() {
            Ok(values) => values,
            Err(e) => {
                error!(key = key.suffix(), error = %e, "could not encode storage entry");
                return None;
            }
        };
        values.extend(rejected.iter().cloned());
        encode(key, &values)
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn medical_records(&self) -> &[MedicalRecord] {
        &self.medical_records
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn cabinet(&self) -> &CabinetConfig {
        &self.cabinet
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Wall time in the practice's zone.
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock.local_now()
    }

    // ── Notifications ────────────────────────────────────────────────────

    /// Queue a transient message; it expires after the configured TTL.
    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) -> String {
        let now = self.clock.now();
        self.notifications.push(message, kind, now)
    }

    pub fn dismiss_notification(&mut self, id: &str) -> bool {
        self.notifications.dismiss(id)
    }

    /// Live notifications in display order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.active(self.clock.now())
    }
}
