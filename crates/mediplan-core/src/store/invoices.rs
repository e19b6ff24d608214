//! Invoice operations.

use chrono::Datelike;
use tracing::debug;

use super::{Store, StoreResult};
use crate::db::StorageKey;
use crate::models::{
    generate_invoice_number, new_id, Invoice, InvoicePatch, InvoiceStatus, NewInvoice,
    NotificationKind, PaymentMethod,
};
use crate::validation::{check_invoice_items, check_invoice_tax, ValidationErrors};

impl Store {
    /// Create an invoice numbered `{prefix}-{year}-{seq}`.
    ///
    /// Totals are computed from the items. A missing `tax` applies the
    /// cabinet tax rate; an invoice created as paid gets its payment time
    /// stamped.
    pub fn add_invoice(&mut self, input: NewInvoice) -> StoreResult<Invoice> {
        let mut errors = ValidationErrors::new();
        if self.get_patient_by_id(&input.patient_id).is_none() {
            errors.add("patientId", "Patient introuvable");
        }
        check_invoice_items(&mut errors, &input.items);
        if let Some(tax) = input.tax {
            check_invoice_tax(&mut errors, tax);
        }
        errors.into_result()?;

        let now = self.now();
        let status = input.status.unwrap_or_default();
        let mut invoice = Invoice {
            id: new_id(),
            number: self.generate_invoice_number(),
            patient_id: input.patient_id,
            appointment_id: input.appointment_id,
            date: input.date.unwrap_or_else(|| self.today()),
            items: input.items,
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
            status,
            payment_method: input.payment_method,
            paid_at: (status == InvoiceStatus::Paid).then_some(now),
            notes: input.notes,
            created_at: Some(now),
            created_by: self.session.as_ref().map(|s| s.id.clone()),
        };
        invoice.recompute_totals();
        invoice.tax = input.tax.unwrap_or_else(|| self.cabinet.tax_on(invoice.subtotal));
        invoice.recompute_totals();

        debug!(number = %invoice.number, total = invoice.total, "adding invoice");
        self.invoices.push(invoice.clone());
        self.persist(&[StorageKey::Invoices]);
        self.notify("Facture créée", NotificationKind::Success);
        Ok(invoice)
    }

    /// Merge `patch` into an invoice, recomputing totals when items or tax
    /// change. Returns `false` for unknown ids.
    pub fn update_invoice(&mut self, id: &str, patch: InvoicePatch) -> StoreResult<bool> {
        let Some(index) = self.invoices.iter().position(|i| i.id == id) else {
            return Ok(false);
        };

        let mut errors = ValidationErrors::new();
        if let Some(items) = &patch.items {
            check_invoice_items(&mut errors, items);
        }
        if let Some(tax) = patch.tax {
            check_invoice_tax(&mut errors, tax);
        }
        if let Some(patient_id) = &patch.patient_id {
            if self.get_patient_by_id(patient_id).is_none() {
                errors.add("patientId", "Patient introuvable");
            }
        }
        errors.into_result()?;

        patch.apply_to(&mut self.invoices[index]);
        self.persist(&[StorageKey::Invoices]);
        Ok(true)
    }

    /// Mark an invoice paid now. Returns `false` for unknown ids.
    pub fn mark_invoice_paid(&mut self, id: &str, method: PaymentMethod) -> bool {
        let now = self.now();
        let Some(invoice) = self.invoices.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        invoice.mark_paid(method, now);
        self.persist(&[StorageKey::Invoices]);
        self.notify("Facture payée", NotificationKind::Success);
        true
    }

    /// Next invoice number for the current year with the cabinet prefix.
    pub fn generate_invoice_number(&self) -> String {
        generate_invoice_number(self.cabinet.invoice_prefix(), &self.invoices, self.today().year())
    }

    pub fn get_invoice_by_id(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn get_invoices_by_patient(&self, patient_id: &str) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.patient_id == patient_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StoreConfig;
    use crate::db::MemoryBackend;
    use crate::models::{CabinetConfigPatch, InvoiceItem};

    fn store_on(date: NaiveDate) -> Store {
        Store::open(
            Box::new(MemoryBackend::new()),
            StoreConfig::default(),
            Arc::new(ManualClock::on(date)),
        )
    }

    fn two_sessions(tax: Option<f64>) -> NewInvoice {
        NewInvoice {
            patient_id: "p2".into(),
            items: vec![InvoiceItem::new("Séance", 2, 150.0)],
            tax,
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_and_number() {
        let mut store = store_on(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        let invoice = store.add_invoice(two_sessions(Some(0.0))).unwrap();

        assert_eq!(invoice.subtotal, 300.0);
        assert_eq!(invoice.total, 300.0);
        assert_eq!(invoice.number, "FAC-2025-003");
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.paid_at, None);
        assert_eq!(invoice.date, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
    }

    #[test]
    fn test_number_restarts_each_year() {
        let mut store = store_on(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(store.generate_invoice_number(), "FAC-2026-001");
        store.add_invoice(two_sessions(None)).unwrap();
        assert_eq!(store.generate_invoice_number(), "FAC-2026-002");
    }

    #[test]
    fn test_cabinet_tax_rate_applies_by_default() {
        let mut store = store_on(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        store.update_cabinet_config(CabinetConfigPatch {
            tax_rate: Some(20.0),
            ..Default::default()
        });

        let invoice = store.add_invoice(two_sessions(None)).unwrap();
        assert_eq!(invoice.tax, 60.0);
        assert_eq!(invoice.total, 360.0);
        assert!(invoice.is_consistent());
    }

    #[test]
    fn test_rejects_empty_items() {
        let mut store = store_on(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        let input = NewInvoice {
            patient_id: "p2".into(),
            ..Default::default()
        };
        assert!(store.add_invoice(input).is_err());
        assert_eq!(store.invoices().len(), 2);
    }

    #[test]
    fn test_update_recomputes() {
        let mut store = store_on(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        let invoice = store.add_invoice(two_sessions(Some(0.0))).unwrap();

        let patch = InvoicePatch {
            tax: Some(30.0),
            ..Default::default()
        };
        assert!(store.update_invoice(&invoice.id, patch).unwrap());
        let updated = store.get_invoice_by_id(&invoice.id).unwrap();
        assert_eq!(updated.total, 330.0);
        assert!(updated.is_consistent());
    }

    #[test]
    fn test_mark_paid() {
        let mut store = store_on(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        let invoice = store.add_invoice(two_sessions(Some(0.0))).unwrap();

        assert!(store.mark_invoice_paid(&invoice.id, PaymentMethod::Transfer));
        let paid = store.get_invoice_by_id(&invoice.id).unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.payment_method, Some(PaymentMethod::Transfer));
        assert_eq!(paid.paid_at, Some(store.now()));

        assert!(!store.mark_invoice_paid("missing", PaymentMethod::Cash));
    }
}
