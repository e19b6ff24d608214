//! Derived views over the collections. Recomputed on every call.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use super::Store;
use crate::models::{
    generate_time_slots, Appointment, AppointmentStatus, InvoiceStatus, Patient, SlotTime,
};

/// Minimum Jaro-Winkler similarity for a fuzzy name match.
const FUZZY_THRESHOLD: f64 = 0.88;

/// Invoice sums by payment state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub total: f64,
    pub paid: f64,
    pub pending: f64,
}

impl Store {
    /// Patients matching `query`, best matches first.
    ///
    /// Substring matches on name, phone or email rank first; typo-tolerant
    /// matches on first or last name follow, by similarity.
    pub fn search_patients(&self, query: &str, limit: usize) -> Vec<&Patient> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.patients.iter().take(limit).collect();
        }
        let digits: String = needle.chars().filter(|c| c.is_ascii_digit()).collect();
        let is_phone_query = !digits.is_empty()
            && needle
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '+');

        let mut exact = Vec::new();
        let mut fuzzy: Vec<(f64, &Patient)> = Vec::new();
        for patient in &self.patients {
            let full_name = patient.full_name().to_lowercase();
            let phone: String = patient.phone.chars().filter(|c| c.is_ascii_digit()).collect();
            if full_name.contains(&needle)
                || patient.email.to_lowercase().contains(&needle)
                || (is_phone_query && phone.contains(&digits))
            {
                exact.push(patient);
                continue;
            }

            let score = [&patient.first_name, &patient.last_name]
                .into_iter()
                .map(|name| strsim::jaro_winkler(&name.to_lowercase(), &needle))
                .fold(0.0, f64::max);
            if score >= FUZZY_THRESHOLD {
                fuzzy.push((score, patient));
            }
        }

        fuzzy.sort_by(|a, b| b.0.total_cmp(&a.0));
        exact
            .into_iter()
            .chain(fuzzy.into_iter().map(|(_, p)| p))
            .take(limit)
            .collect()
    }

    /// Most recently created patients.
    pub fn recent_patients(&self, n: usize) -> Vec<&Patient> {
        let mut patients: Vec<&Patient> = self.patients.iter().collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        patients.truncate(n);
        patients
    }

    /// Appointments dated within `[start, end]`, by date then time.
    pub fn appointments_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Appointment> {
        let mut appointments: Vec<&Appointment> = self
            .appointments
            .iter()
            .filter(|a| a.date >= start && a.date <= end)
            .collect();
        appointments.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        appointments
    }

    /// Completed or in-office visits not yet paid.
    pub fn unpaid_visits(&self) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|a| {
                !a.paid
                    && matches!(a.status, AppointmentStatus::Completed | AppointmentStatus::Present)
            })
            .collect()
    }

    pub fn invoice_totals(&self) -> InvoiceTotals {
        self.invoices
            .iter()
            .fold(InvoiceTotals::default(), |mut totals, invoice| {
                totals.total += invoice.total;
                match invoice.status {
                    InvoiceStatus::Paid => totals.paid += invoice.total,
                    InvoiceStatus::Pending | InvoiceStatus::Partial => totals.pending += invoice.total,
                    InvoiceStatus::Refunded => {}
                }
                totals
            })
    }

    /// Free booking slots for a practitioner on `date`, within the cabinet's
    /// working hours. Cancelled and missed appointments free their slot.
    pub fn available_slots(&self, date: NaiveDate, practitioner_id: &str) -> Vec<SlotTime> {
        let schedule = self.cabinet.working_hours.day(date.weekday());
        if !schedule.enabled {
            return Vec::new();
        }

        let taken: Vec<(u32, u32)> = self
            .appointments
            .iter()
            .filter(|a| {
                a.date == date
                    && a.practitioner_id == practitioner_id
                    && !matches!(a.status, AppointmentStatus::Cancelled | AppointmentStatus::Absent)
            })
            .map(|a| {
                let start = minutes(&a.time);
                (start, start.saturating_add(a.duration))
            })
            .collect();

        generate_time_slots(0, 24, 30)
            .into_iter()
            .filter(|slot| schedule.contains(slot))
            .filter(|slot| {
                let at = minutes(slot);
                !taken.iter().any(|(start, end)| at >= *start && at < *end)
            })
            .collect()
    }
}

fn minutes(slot: &SlotTime) -> u32 {
    let time = slot.to_naive_time();
    time.hour() * 60 + time.minute()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StoreConfig;
    use crate::db::MemoryBackend;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn demo_store() -> Store {
        Store::open(
            Box::new(MemoryBackend::new()),
            StoreConfig::default(),
            Arc::new(ManualClock::on(date("2025-01-13"))),
        )
    }

    fn ids<'a>(patients: Vec<&'a Patient>) -> Vec<&'a str> {
        patients.into_iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_search_substring() {
        let store = demo_store();
        assert_eq!(ids(store.search_patients("ouazz", 10)), vec!["p2"]);
        assert_eq!(ids(store.search_patients("06 99", 10)), vec!["p3"]);
        assert_eq!(ids(store.search_patients("salma.chraibi@", 10)), vec!["p4"]);
        assert_eq!(ids(store.search_patients("", 2)), vec!["p1", "p2"]);
    }

    #[test]
    fn test_search_tolerates_typos() {
        let store = demo_store();
        assert_eq!(ids(store.search_patients("Khadidja", 10)), vec!["p2"]);
        assert!(store.search_patients("Zzzz", 10).is_empty());
    }

    #[test]
    fn test_recent_patients() {
        let store = demo_store();
        assert_eq!(ids(store.recent_patients(2)), vec!["p4", "p3"]);
    }

    #[test]
    fn test_appointments_between_sorted() {
        let store = demo_store();
        let found: Vec<&str> = store
            .appointments_between(date("2025-01-10"), date("2025-01-13"))
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(found, vec!["a5", "a1", "a2", "a3"]);
    }

    #[test]
    fn test_unpaid_visits_include_present() {
        let mut store = demo_store();
        store
            .update_appointment(
                "a2",
                crate::models::AppointmentPatch::status(AppointmentStatus::Present),
            )
            .unwrap();
        let unpaid: Vec<&str> = store.unpaid_visits().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(unpaid, vec!["a2"]);
    }

    #[test]
    fn test_invoice_totals() {
        let store = demo_store();
        let totals = store.invoice_totals();
        assert_eq!(totals.total, 700.0);
        assert_eq!(totals.paid, 700.0);
        assert_eq!(totals.pending, 0.0);
    }

    #[test]
    fn test_available_slots() {
        let store = demo_store();
        // Monday 13th: u2 has 09:00 (30 min) and 10:00 (30 min).
        let slots: Vec<String> = store
            .available_slots(date("2025-01-13"), "u2")
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(slots.len(), 18);
        assert_eq!(slots[0], "08:00");
        assert!(!slots.contains(&"09:00".to_string()));
        assert!(slots.contains(&"09:30".to_string()));
        assert!(!slots.contains(&"10:00".to_string()));
        assert_eq!(slots.last().unwrap(), "17:30");

        // Sunday is closed.
        assert!(store.available_slots(date("2025-01-12"), "u2").is_empty());
    }
}
