//! Patient operations.

use tracing::{debug, info};

use super::{Store, StoreResult};
use crate::db::StorageKey;
use crate::models::{NewPatient, NotificationKind, Patient, PatientPatch};
use crate::validation::{check_patient_fields, validate_new_patient, ValidationErrors};

impl Store {
    /// Create a patient. Visit counter and balance always start at zero.
    pub fn add_patient(&mut self, input: NewPatient) -> StoreResult<Patient> {
        validate_new_patient(&input)?;

        let patient = Patient::new(input, self.today());
        debug!(id = %patient.id, "adding patient");
        self.patients.push(patient.clone());
        self.persist(&[StorageKey::Patients]);
        self.notify("Patient ajouté", NotificationKind::Success);
        Ok(patient)
    }

    /// Merge `patch` into a patient. Returns `false` for unknown ids.
    pub fn update_patient(&mut self, id: &str, patch: PatientPatch) -> StoreResult<bool> {
        let Some(index) = self.patients.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        let mut updated = self.patients[index].clone();
        patch.apply_to(&mut updated);

        let mut errors = ValidationErrors::new();
        check_patient_fields(
            &mut errors,
            &updated.first_name,
            &updated.last_name,
            &updated.email,
            &updated.phone,
        );
        errors.into_result()?;

        self.patients[index] = updated;
        self.persist(&[StorageKey::Patients]);
        self.notify("Patient mis à jour", NotificationKind::Success);
        Ok(true)
    }

    /// Delete a patient together with their appointments and medical records.
    ///
    /// The three collections are written in a single batch. Returns `false`
    /// for unknown ids.
    pub fn delete_patient(&mut self, id: &str) -> bool {
        if !self.patients.iter().any(|p| p.id == id) {
            return false;
        }

        self.patients.retain(|p| p.id != id);
        let appointments_before = self.appointments.len();
        self.appointments.retain(|a| a.patient_id != id);
        let records_before = self.medical_records.len();
        self.medical_records.retain(|r| r.patient_id != id);

        info!(
            id,
            appointments = appointments_before - self.appointments.len(),
            records = records_before - self.medical_records.len(),
            "deleted patient and dependents"
        );
        self.persist(&[
            StorageKey::Patients,
            StorageKey::Appointments,
            StorageKey::MedicalRecords,
        ]);
        self.notify("Patient supprimé", NotificationKind::Success);
        true
    }

    pub fn get_patient_by_id(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }
}
