//! Appointment reminders.
//!
//! Sending is simulated: a reminder only flips the appointment's flag and
//! records the channel used.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use super::Store;
use crate::db::StorageKey;
use crate::models::{Appointment, AppointmentStatus, NotificationKind, ReminderChannel, SlotTime};

/// Values substituted into a reminder template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderData {
    pub patient_name: String,
    pub date: String,
    pub time: String,
    pub cabinet_name: String,
    pub phone: String,
}

/// Replace every `{patient}`, `{date}`, `{time}`, `{cabinet}` and `{phone}`
/// placeholder in `template`.
pub fn format_reminder_message(template: &str, data: &ReminderData) -> String {
    template
        .replace("{patient}", &data.patient_name)
        .replace("{date}", &data.date)
        .replace("{time}", &data.time)
        .replace("{cabinet}", &data.cabinet_name)
        .replace("{phone}", &data.phone)
}

/// Whether an appointment at `date`/`time` is still ahead of `now` and
/// starts within `hours` of it.
pub fn should_send_reminder(date: NaiveDate, time: &SlotTime, hours: i64, now: NaiveDateTime) -> bool {
    let starts_at = date.and_time(time.to_naive_time());
    starts_at < now + Duration::hours(hours) && now < starts_at
}

fn awaits_reminder(appointment: &Appointment, today: NaiveDate) -> bool {
    appointment.date >= today
        && !appointment.reminder_sent
        && !matches!(
            appointment.status,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::Absent
        )
}

impl Store {
    /// Upcoming appointments not yet reminded, soonest first.
    pub fn pending_reminders(&self) -> Vec<&Appointment> {
        let today = self.today();
        let mut pending: Vec<&Appointment> = self
            .appointments
            .iter()
            .filter(|a| awaits_reminder(a, today))
            .collect();
        pending.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
        pending
    }

    /// Upcoming appointments already reminded, latest date first.
    pub fn sent_reminders(&self) -> Vec<&Appointment> {
        let today = self.today();
        let mut sent: Vec<&Appointment> = self
            .appointments
            .iter()
            .filter(|a| a.date >= today && a.reminder_sent)
            .collect();
        sent.sort_by(|a, b| b.date.cmp(&a.date));
        sent
    }

    /// Pending reminders whose appointment starts within the cabinet's
    /// default reminder window. Slots are local wall times.
    pub fn due_reminders(&self) -> Vec<&Appointment> {
        let now = self.local_now();
        let hours = self.cabinet.reminder_settings.default_timing.hours();
        self.pending_reminders()
            .into_iter()
            .filter(|a| should_send_reminder(a.date, &a.time, hours, now))
            .collect()
    }

    /// Mark an appointment reminded over `channel`. Returns `false` for
    /// unknown ids.
    pub fn send_reminder(&mut self, id: &str, channel: ReminderChannel) -> bool {
        let Some(appointment) = self.appointments.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        appointment.reminder_sent = true;
        appointment.reminder_type = Some(channel);
        debug!(id, channel = channel.as_str(), "reminder sent");

        self.persist(&[StorageKey::Appointments]);
        self.notify(
            format!("Rappel {} envoyé", channel.as_str().to_uppercase()),
            NotificationKind::Success,
        );
        true
    }

    /// Send reminders for each id that is still pending, pausing between
    /// sends on the store clock. Each goes out on the patient's preferred
    /// channel. Returns the number sent.
    pub fn send_reminders(&mut self, ids: &[String]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let today = self.today();
        let pacing = self.config.reminder_pacing();
        let mut sent = 0;

        for id in ids {
            let channel = match self.appointments.iter().find(|a| &a.id == id) {
                Some(a) if awaits_reminder(a, today) => self.preferred_channel(&a.patient_id),
                _ => continue,
            };
            self.clock.sleep(pacing);
            if self.send_reminder(id, channel) {
                sent += 1;
            }
        }

        self.notify(
            format!("{} rappels envoyés avec succès", sent),
            NotificationKind::Success,
        );
        sent
    }

    /// Reminder text for an appointment, rendered with the template of the
    /// channel it would be sent on.
    pub fn reminder_message(&self, id: &str) -> Option<String> {
        let appointment = self.get_appointment_by_id(id)?;
        let channel = appointment
            .reminder_type
            .unwrap_or_else(|| self.preferred_channel(&appointment.patient_id));
        let data = ReminderData {
            patient_name: self
                .get_patient_by_id(&appointment.patient_id)
                .map(|p| p.full_name())
                .unwrap_or_default(),
            date: appointment.date.format("%d/%m/%Y").to_string(),
            time: appointment.time.to_string(),
            cabinet_name: self.cabinet.name.clone(),
            phone: self.cabinet.phone.clone(),
        };
        let template = self.cabinet.reminder_settings.template_for(channel);
        Some(format_reminder_message(template, &data))
    }

    fn preferred_channel(&self, patient_id: &str) -> ReminderChannel {
        self.get_patient_by_id(patient_id)
            .map(|p| p.preferred_reminder)
            .unwrap_or(self.cabinet.reminder_settings.default_type)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::StoreConfig;
    use crate::db::MemoryBackend;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn demo_store(clock: ManualClock) -> Store {
        Store::open(Box::new(MemoryBackend::new()), StoreConfig::default(), Arc::new(clock))
    }

    #[test]
    fn test_format_replaces_every_placeholder() {
        let data = ReminderData {
            patient_name: "Salma Chraibi".into(),
            date: "14/01/2025".into(),
            time: "14:00".into(),
            cabinet_name: "Cabinet MediPlan".into(),
            phone: "0537000000".into(),
        };
        let text = format_reminder_message("{patient} {date} {time} {cabinet} {phone} {patient}", &data);
        assert_eq!(
            text,
            "Salma Chraibi 14/01/2025 14:00 Cabinet MediPlan 0537000000 Salma Chraibi"
        );
    }

    #[test]
    fn test_should_send_reminder_window() {
        let now = date("2025-01-13").and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let slot = SlotTime::parse("14:00").unwrap();
        assert!(should_send_reminder(date("2025-01-14"), &slot, 48, now));
        assert!(!should_send_reminder(date("2025-01-14"), &slot, 24, now));
        assert!(!should_send_reminder(date("2025-01-12"), &slot, 48, now));
    }

    #[test]
    fn test_pending_and_sent() {
        let store = demo_store(ManualClock::on(date("2025-01-13")));

        let pending: Vec<&str> = store.pending_reminders().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(pending, vec!["a2", "a4"]);

        let sent: Vec<&str> = store.sent_reminders().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(sent, vec!["a1", "a3"]);
    }

    #[test]
    fn test_send_reminder_flags_and_notifies() {
        let mut store = demo_store(ManualClock::on(date("2025-01-13")));
        assert!(store.send_reminder("a2", ReminderChannel::Whatsapp));

        let a2 = store.get_appointment_by_id("a2").unwrap();
        assert!(a2.reminder_sent);
        assert_eq!(a2.reminder_type, Some(ReminderChannel::Whatsapp));
        assert_eq!(store.notifications()[0].message, "Rappel WHATSAPP envoyé");

        assert!(!store.send_reminder("ghost", ReminderChannel::Sms));
    }

    #[test]
    fn test_batch_send_paces_on_clock() {
        let clock = ManualClock::on(date("2025-01-13"));
        let mut store = demo_store(clock.clone());
        let start = clock.now();

        let ids = vec!["a2".to_string(), "a4".to_string(), "a1".to_string(), "ghost".to_string()];
        assert_eq!(store.send_reminders(&ids), 2);

        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(600));
        let a4 = store.get_appointment_by_id("a4").unwrap();
        assert_eq!(a4.reminder_type, Some(ReminderChannel::Email));
        assert!(store.pending_reminders().is_empty());
        let last = store.notifications().pop().unwrap();
        assert_eq!(last.message, "2 rappels envoyés avec succès");
    }

    #[test]
    fn test_due_reminders_use_cabinet_timing() {
        let clock = ManualClock::on(date("2025-01-13"));
        clock.set(date("2025-01-13").and_hms_opt(9, 0, 0).unwrap().and_utc());
        let store = demo_store(clock);

        // 24h window from 09:00 on the 13th includes a2 (10:00) but not a4 (14th, 14:00).
        let due: Vec<&str> = store.due_reminders().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(due, vec!["a2"]);
    }

    #[test]
    fn test_due_reminders_compare_local_wall_time() {
        // 02:00 UTC on the 13th is 11:00 in a UTC+9 practice: a2 (10:00) has started.
        let clock = ManualClock::on(date("2025-01-13"))
            .with_offset(chrono::FixedOffset::east_opt(9 * 3600).unwrap());
        clock.set(date("2025-01-13").and_hms_opt(2, 0, 0).unwrap().and_utc());
        let store = demo_store(clock);

        assert_eq!(store.local_now(), date("2025-01-13").and_hms_opt(11, 0, 0).unwrap());
        assert!(store.due_reminders().iter().all(|a| a.id != "a2"));
        assert!(store.pending_reminders().iter().any(|a| a.id == "a2"));
    }

    #[test]
    fn test_reminder_message_uses_channel_template() {
        let store = demo_store(ManualClock::on(date("2025-01-13")));
        let text = store.reminder_message("a2").unwrap();
        assert_eq!(text, "Rappel: RDV le 13/01/2025 à 10:00. Cabinet MediPlan");
        assert!(store.reminder_message("ghost").is_none());
    }
}
