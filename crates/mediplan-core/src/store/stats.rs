//! Dashboard statistics.

use chrono::Datelike;
use serde::Serialize;

use super::Store;
use crate::models::{AppointmentStatus, InvoiceStatus};

/// Snapshot aggregate over every collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_patients: u32,
    pub today_appointments: u32,
    /// Dated today or later and not cancelled, completed or missed
    pub upcoming_appointments: u32,
    /// Sum of paid invoice totals
    pub total_revenue: f64,
    /// Paid invoice totals dated in the current month
    pub monthly_revenue: f64,
    /// Fees of completed (`termine`) visits not yet paid. In-office
    /// (`present`) visits are not counted.
    pub pending_payments: f64,
    pub total_invoices: u32,
    pub paid_invoices: u32,
    /// Percentage to one decimal; 0 when nothing has concluded
    pub absence_rate: f64,
    pub reminders_sent: u32,
}

impl Store {
    pub fn get_stats(&self) -> Stats {
        let today = self.today();
        let count = |n: usize| n as u32;

        let paid: Vec<_> = self
            .invoices
            .iter()
            .filter(|i| i.status == InvoiceStatus::Paid)
            .collect();
        let concluded = self
            .appointments
            .iter()
            .filter(|a| matches!(a.status, AppointmentStatus::Completed | AppointmentStatus::Present))
            .count();
        let absent = self
            .appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Absent)
            .count();

        Stats {
            total_patients: count(self.patients.len()),
            today_appointments: count(self.appointments.iter().filter(|a| a.date == today).count()),
            upcoming_appointments: count(
                self.appointments
                    .iter()
                    .filter(|a| a.date >= today && a.status.is_active())
                    .count(),
            ),
            total_revenue: paid.iter().map(|i| i.total).sum(),
            monthly_revenue: paid
                .iter()
                .filter(|i| i.date.year() == today.year() && i.date.month() == today.month())
                .map(|i| i.total)
                .sum(),
            pending_payments: self
                .appointments
                .iter()
                .filter(|a| !a.paid && a.status == AppointmentStatus::Completed)
                .map(|a| a.fee)
                .sum(),
            total_invoices: count(self.invoices.len()),
            paid_invoices: count(paid.len()),
            absence_rate: absence_rate(absent, concluded),
            reminders_sent: count(self.appointments.iter().filter(|a| a.reminder_sent).count()),
        }
    }
}

fn absence_rate(absent: usize, concluded: usize) -> f64 {
    let total = absent + concluded;
    if total == 0 {
        return 0.0;
    }
    let rate = absent as f64 / total as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}
