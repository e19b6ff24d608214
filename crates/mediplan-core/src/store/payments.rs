//! Encashing completed visits.

use tracing::debug;

use super::{Store, StoreResult};
use crate::db::StorageKey;
use crate::models::{
    Appointment, AppointmentStatus, Invoice, InvoiceItem, InvoiceStatus, NewInvoice,
    NotificationKind, PaymentMethod,
};

impl Store {
    /// Visits that can be billed (`termine` or `present`), newest first.
    pub fn billable_appointments(&self) -> Vec<&Appointment> {
        let mut billable: Vec<&Appointment> = self
            .appointments
            .iter()
            .filter(|a| matches!(a.status, AppointmentStatus::Completed | AppointmentStatus::Present))
            .collect();
        billable.sort_by(|a, b| b.date.cmp(&a.date));
        billable
    }

    /// Mark a visit paid and issue a paid invoice for its fee.
    ///
    /// Returns `Ok(None)` for unknown ids and visits already paid.
    pub fn record_appointment_payment(
        &mut self,
        id: &str,
        method: PaymentMethod,
    ) -> StoreResult<Option<Invoice>> {
        let Some(appointment) = self.get_appointment_by_id(id) else {
            return Ok(None);
        };
        if appointment.paid {
            debug!(id, "visit already paid, no invoice issued");
            return Ok(None);
        }
        let input = NewInvoice {
            patient_id: appointment.patient_id.clone(),
            appointment_id: Some(appointment.id.clone()),
            date: Some(self.today()),
            items: vec![InvoiceItem::new(appointment.kind.label(), 1, appointment.fee)],
            tax: Some(0.0),
            status: Some(InvoiceStatus::Paid),
            payment_method: Some(method),
            notes: String::new(),
        };
        let invoice = self.add_invoice(input)?;

        let paid_at = invoice.paid_at;
        if let Some(appointment) = self.appointments.iter_mut().find(|a| a.id == id) {
            appointment.paid = true;
            appointment.payment_method = Some(method);
            appointment.paid_at = paid_at;
        }
        self.persist(&[StorageKey::Appointments]);
        self.notify("Paiement enregistré et facture créée", NotificationKind::Success);
        Ok(Some(invoice))
    }
}
