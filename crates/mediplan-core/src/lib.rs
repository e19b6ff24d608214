//! MediPlan Core Library
//!
//! Local-first store for a small medical practice: patients, scheduling,
//! medical records, invoicing, staff accounts and appointment reminders.
//!
//! # Architecture
//!
//! ```text
//!   UI shell (Swift/Kotlin/Web)
//!            │  JSON entities, FFI records
//!            ▼
//!   ┌─────────────────────┐      ┌─────────────────────┐
//!   │   MediplanCore      │─────▶│  NotificationQueue  │
//!   │   (Arc<Mutex>)      │      │  (TTL, never saved) │
//!   └─────────┬───────────┘      └─────────────────────┘
//!             │ every mutation
//!             ▼
//!   ┌─────────────────────┐
//!   │      Store          │  in-memory collections
//!   └─────────┬───────────┘
//!             │ one JSON document per collection
//!             ▼
//!   ┌─────────────────────┐
//!   │    Persistence      │  <prefix>patients, <prefix>auth, ...
//!   └─────────┬───────────┘
//!             ▼
//!      SQLite / memory
//! ```
//!
//! # Core Principle
//!
//! **Storage failures never reach the caller.** A failed read falls back to
//! defaults and a failed write leaves the in-memory state authoritative.
//!
//! # Modules
//!
//! - [`db`]: Key-value backends and the prefixed persistence adapter
//! - [`models`]: Domain types (Patient, Appointment, Invoice, etc.)
//! - [`store`]: The clinic store and its derived queries
//! - [`auth`]: Password hashing and credential checks
//! - [`validation`]: Field-level input validation
//! - [`notifications`]: Transient message queue
//! - [`clock`]: Real and simulated time
//! - [`config`]: Store configuration

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod models;
pub mod notifications;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use auth::AuthError;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use db::{KeyValueBackend, MemoryBackend, Persistence, SqliteBackend, StorageKey};
pub use models::{
    Appointment, AppointmentStatus, AppointmentType, CabinetConfig, Invoice, InvoiceStatus,
    MedicalRecord, Notification, NotificationKind, Patient, PaymentMethod, ReminderChannel,
    Role, SlotTime, User, UserProfile,
};
pub use store::{Stats, Store, StoreError, StoreResult};
pub use validation::ValidationErrors;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MediplanError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Operation refused: {0}")]
    Refused(String),

    #[error("{0}")]
    AuthError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<store::StoreError> for MediplanError {
    fn from(e: store::StoreError) -> Self {
        match e {
            StoreError::Validation(errors) => MediplanError::ValidationError(errors.to_string()),
            StoreError::ProtectedUser(message) => MediplanError::Refused(message),
            StoreError::Storage(e) => MediplanError::StorageError(e.to_string()),
        }
    }
}

impl From<db::StorageError> for MediplanError {
    fn from(e: db::StorageError) -> Self {
        MediplanError::StorageError(e.to_string())
    }
}

impl From<AuthError> for MediplanError {
    fn from(e: AuthError) -> Self {
        MediplanError::AuthError(e.to_string())
    }
}

impl From<serde_json::Error> for MediplanError {
    fn from(e: serde_json::Error) -> Self {
        MediplanError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MediplanError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MediplanError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a store backed by the SQLite file at `path`.
///
/// Configuration is read from `MEDIPLAN_*` environment variables.
#[uniffi::export]
pub fn open_store(path: String) -> Result<Arc<MediplanCore>, MediplanError> {
    let store = Store::open_sqlite(&path, StoreConfig::from_env())?;
    Ok(MediplanCore::wrap(store))
}

/// Create an in-memory store (for testing and demos).
#[uniffi::export]
pub fn open_store_in_memory() -> Result<Arc<MediplanCore>, MediplanError> {
    Ok(MediplanCore::wrap(Store::open_in_memory(StoreConfig::from_env())))
}

// =========================================================================
// Main FFI Object
// =========================================================================

/// Thread-safe handle over a [`Store`].
///
/// Entities cross the boundary as JSON strings in the persisted wire format;
/// inputs and patches use the same camelCase field names.
#[derive(uniffi::Object)]
pub struct MediplanCore {
    store: Arc<Mutex<Store>>,
}

impl MediplanCore {
    fn wrap(store: Store) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(Mutex::new(store)),
        })
    }
}

#[uniffi::export]
impl MediplanCore {
    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    pub fn login(&self, email: String, password: String) -> Result<FfiUserProfile, MediplanError> {
        let mut store = self.store.lock()?;
        Ok(store.login(&email, &password)?.into())
    }

    pub fn logout(&self) -> Result<(), MediplanError> {
        self.store.lock()?.logout();
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<FfiUserProfile>, MediplanError> {
        let store = self.store.lock()?;
        Ok(store.current_user().cloned().map(Into::into))
    }

    // ---------------------------------------------------------------------
    // Patients
    // ---------------------------------------------------------------------

    pub fn list_patients(&self) -> Result<String, MediplanError> {
        to_json(self.store.lock()?.patients())
    }

    pub fn get_patient(&self, id: String) -> Result<Option<String>, MediplanError> {
        let store = self.store.lock()?;
        store.get_patient_by_id(&id).map(to_json).transpose()
    }

    /// Create a patient from a `NewPatient` JSON object.
    pub fn add_patient(&self, input_json: String) -> Result<String, MediplanError> {
        let input = from_json(&input_json)?;
        let patient = self.store.lock()?.add_patient(input)?;
        to_json(&patient)
    }

    pub fn update_patient(&self, id: String, patch_json: String) -> Result<bool, MediplanError> {
        let patch = from_json(&patch_json)?;
        Ok(self.store.lock()?.update_patient(&id, patch)?)
    }

    /// Delete a patient with their appointments and medical records.
    pub fn delete_patient(&self, id: String) -> Result<bool, MediplanError> {
        Ok(self.store.lock()?.delete_patient(&id))
    }

    pub fn search_patients(&self, query: String, limit: u32) -> Result<String, MediplanError> {
        to_json(&self.store.lock()?.search_patients(&query, limit as usize))
    }

    // ---------------------------------------------------------------------
    // Appointments
    // ---------------------------------------------------------------------

    pub fn list_appointments(&self) -> Result<String, MediplanError> {
        to_json(self.store.lock()?.appointments())
    }

    pub fn get_appointments_by_date(&self, date: String) -> Result<String, MediplanError> {
        let date = parse_date(&date)?;
        to_json(&self.store.lock()?.get_appointments_by_date(date))
    }

    pub fn get_appointments_by_patient(&self, patient_id: String) -> Result<String, MediplanError> {
        to_json(&self.store.lock()?.get_appointments_by_patient(&patient_id))
    }

    pub fn add_appointment(&self, input_json: String) -> Result<String, MediplanError> {
        let input = from_json(&input_json)?;
        let appointment = self.store.lock()?.add_appointment(input)?;
        to_json(&appointment)
    }

    pub fn update_appointment(&self, id: String, patch_json: String) -> Result<bool, MediplanError> {
        let patch = from_json(&patch_json)?;
        Ok(self.store.lock()?.update_appointment(&id, patch)?)
    }

    pub fn delete_appointment(&self, id: String) -> Result<bool, MediplanError> {
        Ok(self.store.lock()?.delete_appointment(&id))
    }

    /// Free `HH:MM` slots for a practitioner on a `YYYY-MM-DD` date.
    pub fn available_slots(
        &self,
        date: String,
        practitioner_id: String,
    ) -> Result<Vec<String>, MediplanError> {
        let date = parse_date(&date)?;
        let store = self.store.lock()?;
        Ok(store
            .available_slots(date, &practitioner_id)
            .into_iter()
            .map(String::from)
            .collect())
    }

    /// Mark a visit paid and issue its invoice. Returns the invoice JSON.
    pub fn record_appointment_payment(
        &self,
        id: String,
        method: String,
    ) -> Result<Option<String>, MediplanError> {
        let method: PaymentMethod = parse_wire(&method)?;
        let invoice = self.store.lock()?.record_appointment_payment(&id, method)?;
        invoice.as_ref().map(to_json).transpose()
    }

    // ---------------------------------------------------------------------
    // Medical records
    // ---------------------------------------------------------------------

    pub fn get_medical_records_by_patient(&self, patient_id: String) -> Result<String, MediplanError> {
        to_json(&self.store.lock()?.get_medical_records_by_patient(&patient_id))
    }

    pub fn add_medical_record(&self, input_json: String) -> Result<String, MediplanError> {
        let input = from_json(&input_json)?;
        let record = self.store.lock()?.add_medical_record(input)?;
        to_json(&record)
    }

    pub fn update_medical_record(&self, id: String, patch_json: String) -> Result<bool, MediplanError> {
        let patch = from_json(&patch_json)?;
        Ok(self.store.lock()?.update_medical_record(&id, patch)?)
    }

    pub fn delete_medical_record(&self, id: String) -> Result<bool, MediplanError> {
        Ok(self.store.lock()?.delete_medical_record(&id))
    }

    // ---------------------------------------------------------------------
    // Invoices
    // ---------------------------------------------------------------------

    pub fn list_invoices(&self) -> Result<String, MediplanError> {
        to_json(self.store.lock()?.invoices())
    }

    pub fn add_invoice(&self, input_json: String) -> Result<String, MediplanError> {
        let input = from_json(&input_json)?;
        let invoice = self.store.lock()?.add_invoice(input)?;
        to_json(&invoice)
    }

    pub fn update_invoice(&self, id: String, patch_json: String) -> Result<bool, MediplanError> {
        let patch = from_json(&patch_json)?;
        Ok(self.store.lock()?.update_invoice(&id, patch)?)
    }

    pub fn mark_invoice_paid(&self, id: String, method: String) -> Result<bool, MediplanError> {
        let method: PaymentMethod = parse_wire(&method)?;
        Ok(self.store.lock()?.mark_invoice_paid(&id, method))
    }

    pub fn next_invoice_number(&self) -> Result<String, MediplanError> {
        Ok(self.store.lock()?.generate_invoice_number())
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// Staff accounts without their password hashes.
    pub fn list_users(&self) -> Result<Vec<FfiUserProfile>, MediplanError> {
        let store = self.store.lock()?;
        Ok(store.users().iter().map(|u| u.profile().into()).collect())
    }

    pub fn add_user(&self, input_json: String) -> Result<FfiUserProfile, MediplanError> {
        let input = from_json(&input_json)?;
        Ok(self.store.lock()?.add_user(input)?.into())
    }

    pub fn update_user(&self, id: String, patch_json: String) -> Result<bool, MediplanError> {
        let patch = from_json(&patch_json)?;
        Ok(self.store.lock()?.update_user(&id, patch)?)
    }

    pub fn delete_user(&self, id: String) -> Result<bool, MediplanError> {
        Ok(self.store.lock()?.delete_user(&id)?)
    }

    // ---------------------------------------------------------------------
    // Cabinet settings
    // ---------------------------------------------------------------------

    pub fn get_cabinet_config(&self) -> Result<String, MediplanError> {
        to_json(self.store.lock()?.cabinet())
    }

    /// Shallow-merge a partial cabinet configuration.
    pub fn update_cabinet_config(&self, patch_json: String) -> Result<(), MediplanError> {
        let patch = from_json(&patch_json)?;
        self.store.lock()?.update_cabinet_config(patch);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reminders
    // ---------------------------------------------------------------------

    pub fn pending_reminders(&self) -> Result<String, MediplanError> {
        to_json(&self.store.lock()?.pending_reminders())
    }

    pub fn send_reminder(&self, id: String, channel: String) -> Result<bool, MediplanError> {
        let channel: ReminderChannel = parse_wire(&channel)?;
        Ok(self.store.lock()?.send_reminder(&id, channel))
    }

    /// Send every still-pending reminder among `ids`. Blocks for the
    /// configured pacing between sends.
    pub fn send_reminders(&self, ids: Vec<String>) -> Result<u32, MediplanError> {
        Ok(self.store.lock()?.send_reminders(&ids) as u32)
    }

    pub fn reminder_message(&self, id: String) -> Result<Option<String>, MediplanError> {
        Ok(self.store.lock()?.reminder_message(&id))
    }

    // ---------------------------------------------------------------------
    // Dashboard & notifications
    // ---------------------------------------------------------------------

    pub fn get_stats(&self) -> Result<FfiStats, MediplanError> {
        Ok(self.store.lock()?.get_stats().into())
    }

    pub fn notifications(&self) -> Result<Vec<FfiNotification>, MediplanError> {
        let store = self.store.lock()?;
        Ok(store.notifications().into_iter().map(Into::into).collect())
    }

    pub fn dismiss_notification(&self, id: String) -> Result<bool, MediplanError> {
        Ok(self.store.lock()?.dismiss_notification(&id))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, MediplanError> {
    Ok(serde_json::to_string(value)?)
}

fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, MediplanError> {
    Ok(serde_json::from_str(json)?)
}

fn parse_date(date: &str) -> Result<NaiveDate, MediplanError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| MediplanError::InvalidInput(format!("date {:?}: {}", date, e)))
}

/// Parse a bare wire identifier such as `"card"` into its enum.
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T, MediplanError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| MediplanError::InvalidInput(format!("unknown value {:?}", value)))
}

// =========================================================================
// FFI Record Types
// =========================================================================

/// FFI-safe user profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: String,
    pub specialty: Option<String>,
    pub is_active: bool,
}

impl From<UserProfile> for FfiUserProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            role: profile.role.as_str().to_string(),
            phone: profile.phone,
            specialty: profile.specialty,
            is_active: profile.is_active,
        }
    }
}

/// FFI-safe dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStats {
    pub total_patients: u32,
    pub today_appointments: u32,
    pub upcoming_appointments: u32,
    pub total_revenue: f64,
    pub monthly_revenue: f64,
    pub pending_payments: f64,
    pub total_invoices: u32,
    pub paid_invoices: u32,
    pub absence_rate: f64,
    pub reminders_sent: u32,
}

impl From<Stats> for FfiStats {
    fn from(stats: Stats) -> Self {
        Self {
            total_patients: stats.total_patients,
            today_appointments: stats.today_appointments,
            upcoming_appointments: stats.upcoming_appointments,
            total_revenue: stats.total_revenue,
            monthly_revenue: stats.monthly_revenue,
            pending_payments: stats.pending_payments,
            total_invoices: stats.total_invoices,
            paid_invoices: stats.paid_invoices,
            absence_rate: stats.absence_rate,
            reminders_sent: stats.reminders_sent,
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub id: String,
    pub message: String,
    pub kind: String,
    /// Unix milliseconds
    pub expires_at_ms: i64,
}

impl From<Notification> for FfiNotification {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            message: n.message,
            kind: n.kind.as_str().to_string(),
            expires_at_ms: n.expires_at.timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> Arc<MediplanCore> {
        open_store_in_memory().unwrap()
    }

    #[test]
    fn test_login_through_ffi() {
        let core = core();
        let profile = core
            .login("admin@mediplan.ma".into(), "admin123".into())
            .unwrap();
        assert_eq!(profile.role, "admin");
        assert_eq!(core.current_user().unwrap().unwrap().id, profile.id);

        let err = core.login("admin@mediplan.ma".into(), "bad".into()).unwrap_err();
        assert!(matches!(err, MediplanError::AuthError(_)));
    }

    #[test]
    fn test_patient_json_round_trip() {
        let core = core();
        let created = core
            .add_patient(
                r#"{"firstName":"Yassine","lastName":"Tazi","phone":"0612345678"}"#.into(),
            )
            .unwrap();
        let patient: Patient = serde_json::from_str(&created).unwrap();
        assert_eq!(patient.last_name, "Tazi");

        let fetched = core.get_patient(patient.id.clone()).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Patient>(&fetched).unwrap(), patient);
    }

    #[test]
    fn test_validation_error_surfaces_fields() {
        let err = core().add_patient(r#"{"email":"nope"}"#.into()).unwrap_err();
        match err {
            MediplanError::ValidationError(message) => {
                assert!(message.contains("firstName"));
                assert!(message.contains("Email invalide"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wire_enums_are_checked() {
        let core = core();
        assert!(core.mark_invoice_paid("inv1".into(), "card".into()).unwrap());
        assert!(matches!(
            core.mark_invoice_paid("inv1".into(), "bitcoin".into()),
            Err(MediplanError::InvalidInput(_))
        ));
        assert!(matches!(
            core.get_appointments_by_date("13/01/2025".into()),
            Err(MediplanError::InvalidInput(_))
        ));
    }
}
