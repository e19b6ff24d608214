//! Invoice models and numbering.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance when checking stored totals against their items.
const TOTAL_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
    Online,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Check,
        PaymentMethod::Online,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Espèces",
            PaymentMethod::Card => "Carte bancaire",
            PaymentMethod::Transfer => "Virement",
            PaymentMethod::Check => "Chèque",
            PaymentMethod::Online => "Paiement en ligne",
        }
    }
}

/// Invoice payment state. Only `pending` and `paid` are produced by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Refunded,
}

impl InvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "En attente",
            InvoiceStatus::Partial => "Partiel",
            InvoiceStatus::Paid => "Payé",
            InvoiceStatus::Refunded => "Remboursé",
        }
    }
}

/// One billed line. `total` is always `quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub total: f64,
}

impl InvoiceItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        let mut item = Self {
            description: description.into(),
            quantity,
            unit_price,
            total: 0.0,
        };
        item.recompute();
        item
    }

    fn recompute(&mut self) {
        self.total = self.quantity as f64 * self.unit_price;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    /// Formatted `{prefix}-{year}-{seq}`
    pub number: String,
    pub patient_id: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub appointment_id: Option<String>,
    pub date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    pub total: f64,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub created_by: Option<String>,
}

impl Invoice {
    /// Recompute item totals, `subtotal` and `total` from the items and `tax`.
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.recompute();
        }
        self.subtotal = self.items.iter().map(|item| item.total).sum();
        self.total = self.subtotal + self.tax;
    }

    /// Whether every stored total matches its items.
    pub fn is_consistent(&self) -> bool {
        let items_ok = self
            .items
            .iter()
            .all(|item| (item.total - item.quantity as f64 * item.unit_price).abs() < TOTAL_EPSILON);
        let subtotal: f64 = self.items.iter().map(|item| item.total).sum();
        items_ok
            && (self.subtotal - subtotal).abs() < TOTAL_EPSILON
            && (self.total - (self.subtotal + self.tax)).abs() < TOTAL_EPSILON
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn mark_paid(&mut self, method: PaymentMethod, at: DateTime<Utc>) {
        self.status = InvoiceStatus::Paid;
        self.payment_method = Some(method);
        self.paid_at = Some(at);
    }
}

/// Caller input for a new invoice. Number, totals and audit fields are
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewInvoice {
    pub patient_id: String,
    pub appointment_id: Option<String>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub items: Vec<InvoiceItem>,
    /// Absolute tax amount; `None` applies the cabinet tax rate to the subtotal
    pub tax: Option<f64>,
    pub status: Option<InvoiceStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoicePatch {
    pub patient_id: Option<String>,
    pub appointment_id: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub items: Option<Vec<InvoiceItem>>,
    pub tax: Option<f64>,
    pub status: Option<InvoiceStatus>,
    pub payment_method: Option<Option<PaymentMethod>>,
    pub paid_at: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
}

impl InvoicePatch {
    /// Whether applying this patch changes the amounts.
    pub fn touches_amounts(&self) -> bool {
        self.items.is_some() || self.tax.is_some()
    }

    pub fn apply_to(self, invoice: &mut Invoice) {
        let recompute = self.touches_amounts();
        merge_fields!(self => invoice;
            patient_id, appointment_id, date, items, tax, status, payment_method, paid_at, notes,
        );
        if recompute {
            invoice.recompute_totals();
        }
    }
}

/// Next invoice number for `year`: `{prefix}-{year}-{seq}` where `seq` is one
/// more than the number of existing invoices whose number contains
/// `{prefix}-{year}`, zero-padded to three digits.
pub fn generate_invoice_number(prefix: &str, existing: &[Invoice], year: i32) -> String {
    let stem = format!("{}-{}", prefix, year);
    let count = existing
        .iter()
        .filter(|invoice| invoice.number.contains(&stem))
        .count();
    format!("{}-{:03}", stem, count + 1)
}
