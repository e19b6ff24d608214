//! Appointment operations.

use chrono::NaiveDate;
use tracing::debug;

use super::{Store, StoreResult};
use crate::db::StorageKey;
use crate::models::{Appointment, AppointmentPatch, NewAppointment, NotificationKind};
use crate::validation::{check_visit_terms, ValidationErrors};

impl Store {
    /// Schedule an appointment. Status starts at `planifie`; the reminder
    /// channel defaults to the patient's preference.
    pub fn add_appointment(&mut self, input: NewAppointment) -> StoreResult<Appointment> {
        let mut errors = ValidationErrors::new();
        self.check_appointment_refs(&mut errors, &input.patient_id, &input.practitioner_id);
        check_visit_terms(&mut errors, input.duration, input.fee);
        errors.into_result()?;

        let channel = input.reminder_type.unwrap_or_else(|| {
            self.get_patient_by_id(&input.patient_id)
                .map(|p| p.preferred_reminder)
                .unwrap_or(self.cabinet.reminder_settings.default_type)
        });
        let created_by = self.session.as_ref().map(|s| s.id.clone());
        let appointment = Appointment::new(input, channel, self.now(), created_by);

        debug!(id = %appointment.id, date = %appointment.date, time = %appointment.time, "adding appointment");
        self.appointments.push(appointment.clone());
        self.persist(&[StorageKey::Appointments]);
        self.notify("RDV créé", NotificationKind::Success);
        Ok(appointment)
    }

    /// Merge `patch` into an appointment. Any status may be set; transitions
    /// are not enforced. Returns `false` for unknown ids.
    pub fn update_appointment(&mut self, id: &str, patch: AppointmentPatch) -> StoreResult<bool> {
        let Some(index) = self.appointments.iter().position(|a| a.id == id) else {
            return Ok(false);
        };

        let mut errors = ValidationErrors::new();
        check_visit_terms(&mut errors, patch.duration, patch.fee);

        let mut updated = self.appointments[index].clone();
        patch.apply_to(&mut updated);
        self.check_appointment_refs(&mut errors, &updated.patient_id, &updated.practitioner_id);
        errors.into_result()?;

        let previous = self.appointments[index].status;
        if previous != updated.status && !previous.can_transition_to(updated.status) {
            debug!(id, from = ?previous, to = ?updated.status, "off-workflow status change");
        }

        self.appointments[index] = updated;
        self.persist(&[StorageKey::Appointments]);
        Ok(true)
    }

    /// Returns `false` for unknown ids.
    pub fn delete_appointment(&mut self, id: &str) -> bool {
        let before = self.appointments.len();
        self.appointments.retain(|a| a.id != id);
        if self.appointments.len() == before {
            return false;
        }
        self.persist(&[StorageKey::Appointments]);
        self.notify("RDV supprimé", NotificationKind::Success);
        true
    }

    pub fn get_appointment_by_id(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn get_appointments_by_patient(&self, patient_id: &str) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .collect()
    }

    pub fn get_appointments_by_date(&self, date: NaiveDate) -> Vec<&Appointment> {
        self.appointments.iter().filter(|a| a.date == date).collect()
    }

    fn check_appointment_refs(&self, errors: &mut ValidationErrors, patient_id: &str, practitioner_id: &str) {
        if self.get_patient_by_id(patient_id).is_none() {
            errors.add("patientId", "Patient introuvable");
        }
        match self.get_user_by_id(practitioner_id) {
            Some(user) if user.role.is_practitioner() => {}
            _ => errors.add("practitionerId", "Praticien introuvable"),
        }
    }
}
