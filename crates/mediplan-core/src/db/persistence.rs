//! Tenant-namespaced JSON persistence with fallback-on-failure semantics.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::KeyValueBackend;

/// Literal stored under the `initialized` key once seeding has happened.
pub const INITIALIZED_MARKER: &str = "true";

/// Default tenant prefix for every storage key.
pub const DEFAULT_TENANT_PREFIX: &str = "mediplan_";

/// Logical storage slots. Each maps to `<prefix><suffix>` in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Patients,
    Appointments,
    MedicalRecords,
    Invoices,
    Users,
    Cabinet,
    Auth,
    Initialized,
}

impl StorageKey {
    /// Every collection slot (excludes session and marker keys).
    pub const COLLECTIONS: [StorageKey; 6] = [
        StorageKey::Patients,
        StorageKey::Appointments,
        StorageKey::MedicalRecords,
        StorageKey::Invoices,
        StorageKey::Users,
        StorageKey::Cabinet,
    ];

    /// Key suffix as laid out in storage.
    pub fn suffix(&self) -> &'static str {
        match self {
            StorageKey::Patients => "patients",
            StorageKey::Appointments => "appointments",
            StorageKey::MedicalRecords => "records",
            StorageKey::Invoices => "invoices",
            StorageKey::Users => "users",
            StorageKey::Cabinet => "cabinet",
            StorageKey::Auth => "auth",
            StorageKey::Initialized => "initialized",
        }
    }
}

/// Result of reading one storage slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Missing,
    /// Present but undecodable, or the backend could not be read.
    Unreadable,
    Present(T),
}

/// A decoded list plus the raw elements that did not decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub items: Vec<T>,
    pub rejected: Vec<Value>,
}

/// Best-effort mirror of in-memory state into a key-value backend.
///
/// Reads fall back to a caller-provided default and writes are logged and
/// dropped on failure; neither ever returns an error to the caller.
pub struct Persistence {
    backend: Box<dyn KeyValueBackend>,
    prefix: String,
}

impl Persistence {
    /// Wrap a backend under a tenant prefix.
    pub fn new(backend: Box<dyn KeyValueBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Tenant prefix applied to every key.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Fully-qualified backend key for a slot.
    pub fn full_key(&self, key: StorageKey) -> String {
        format!("{}{}", self.prefix, key.suffix())
    }

    /// Decode the value under `key`, or return `fallback` if it is missing or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey, fallback: T) -> T {
        self.load_optional(key).unwrap_or(fallback)
    }

    /// Decode the value under `key` if present and well-formed.
    pub fn load_optional<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        match self.read(key) {
            Slot::Present(value) => Some(value),
            Slot::Missing | Slot::Unreadable => None,
        }
    }

    /// Read and decode the value under `key`.
    pub fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Slot<T> {
        let full_key = self.full_key(key);
        let raw = match self.read_raw(&full_key) {
            Slot::Present(raw) => raw,
            Slot::Missing => return Slot::Missing,
            Slot::Unreadable => return Slot::Unreadable,
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Slot::Present(value),
            Err(e) => {
                warn!(key = %full_key, error = %e, "corrupt storage entry, using fallback");
                Slot::Unreadable
            }
        }
    }

    /// Read a JSON list under `key`, decoding element by element.
    ///
    /// Elements that do not decode are returned untouched in
    /// [`Decoded::rejected`]; the slot is only unreadable if it is not a list.
    pub fn read_list<T: DeserializeOwned>(&self, key: StorageKey) -> Slot<Decoded<T>> {
        let full_key = self.full_key(key);
        let values: Vec<Value> = match self.read(key) {
            Slot::Present(values) => values,
            Slot::Missing => return Slot::Missing,
            Slot::Unreadable => return Slot::Unreadable,
        };

        let mut decoded = Decoded {
            items: Vec::with_capacity(values.len()),
            rejected: Vec::new(),
        };
        for value in values {
            match T::deserialize(&value) {
                Ok(item) => decoded.items.push(item),
                Err(e) => {
                    let id = value.get("id").and_then(Value::as_str).unwrap_or("?");
                    warn!(key = %full_key, id, error = %e, "unreadable entry kept as is");
                    decoded.rejected.push(value);
                }
            }
        }
        Slot::Present(decoded)
    }

    fn read_raw(&self, full_key: &str) -> Slot<String> {
        match self.backend.get(full_key) {
            Ok(Some(raw)) => Slot::Present(raw),
            Ok(None) => Slot::Missing,
            Err(e) => {
                warn!(key = %full_key, error = %e, "storage read failed, using fallback");
                Slot::Unreadable
            }
        }
    }

    /// Encode and store a value. Failures are logged and ignored.
    pub fn save<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        if let Some(encoded) = encode(key, value) {
            self.save_all(vec![(key, encoded)]);
        }
    }

    /// Store several pre-encoded values in one atomic write.
    pub fn save_all(&self, entries: Vec<(StorageKey, String)>) {
        if entries.is_empty() {
            return;
        }
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(key, value)| (self.full_key(key), value))
            .collect();

        match self.backend.set_many(&entries) {
            Ok(()) => debug!(count = entries.len(), "persisted storage entries"),
            Err(e) => error!(error = %e, count = entries.len(), "storage write failed"),
        }
    }

    /// Remove a slot. Failures are logged and ignored.
    pub fn remove(&self, key: StorageKey) {
        let full_key = self.full_key(key);
        if let Err(e) = self.backend.remove(&full_key) {
            error!(key = %full_key, error = %e, "storage remove failed");
        }
    }

    /// Whether the one-time seeding has already happened.
    pub fn is_initialized(&self) -> bool {
        match self.backend.get(&self.full_key(StorageKey::Initialized)) {
            Ok(value) => value.is_some(),
            Err(e) => {
                warn!(error = %e, "could not read initialized flag");
                false
            }
        }
    }

    /// Record that seeding has happened.
    pub fn mark_initialized(&self) {
        let full_key = self.full_key(StorageKey::Initialized);
        if let Err(e) = self.backend.set(&full_key, INITIALIZED_MARKER) {
            error!(key = %full_key, error = %e, "could not write initialized flag");
        }
    }
}

/// Encode a value for storage, logging instead of failing.
pub fn encode<T: Serialize + ?Sized>(key: StorageKey, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(encoded) => Some(encoded),
        Err(e) => {
            error!(key = key.suffix(), error = %e, "could not encode storage entry");
            None
        }
    }
}
