//! Medical record operations.

use super::{Store, StoreResult};
use crate::db::StorageKey;
use crate::models::{MedicalRecord, MedicalRecordPatch, NewMedicalRecord, NotificationKind};
use crate::validation::ValidationErrors;

impl Store {
    /// Add a record dated today and attributed to the current session user.
    pub fn add_medical_record(&mut self, input: NewMedicalRecord) -> StoreResult<MedicalRecord> {
        let mut errors = ValidationErrors::new();
        if self.get_patient_by_id(&input.patient_id).is_none() {
            errors.add("patientId", "Patient introuvable");
        }
        if input.title.trim().is_empty() {
            errors.add("title", "Titre requis");
        }
        errors.into_result()?;

        let created_by = self.session.as_ref().map(|s| s.id.clone());
        let record = MedicalRecord::new(input, self.today(), created_by);
        self.medical_records.push(record.clone());
        self.persist(&[StorageKey::MedicalRecords]);
        self.notify("Dossier ajouté", NotificationKind::Success);
        Ok(record)
    }

    /// Merge `patch` into a record; its date never changes. Returns `false`
    /// for unknown ids.
    pub fn update_medical_record(&mut self, id: &str, patch: MedicalRecordPatch) -> StoreResult<bool> {
        let Some(record) = self.medical_records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            let mut errors = ValidationErrors::new();
            errors.add("title", "Titre requis");
            return Err(errors.into());
        }

        patch.apply_to(record);
        self.persist(&[StorageKey::MedicalRecords]);
        self.notify("Dossier mis à jour", NotificationKind::Success);
        Ok(true)
    }

    pub fn delete_medical_record(&mut self, id: &str) -> bool {
        let before = self.medical_records.len();
        self.medical_records.retain(|r| r.id != id);
        if self.medical_records.len() == before {
            return false;
        }
        self.persist(&[StorageKey::MedicalRecords]);
        self.notify("Dossier supprimé", NotificationKind::Success);
        true
    }

    /// A patient's records, newest first.
    pub fn get_medical_records_by_patient(&self, patient_id: &str) -> Vec<&MedicalRecord> {
        let mut records: Vec<&MedicalRecord> = self
            .medical_records
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }
}
