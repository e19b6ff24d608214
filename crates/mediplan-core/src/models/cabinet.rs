//! Practice-wide settings singleton.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::{ReminderChannel, SlotTime};

/// Opening hours for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaySchedule {
    pub start: SlotTime,
    pub end: SlotTime,
    pub enabled: bool,
}

impl DaySchedule {
    fn open(start: &str, end: &str) -> Self {
        Self {
            start: SlotTime::parse(start).unwrap_or_default(),
            end: SlotTime::parse(end).unwrap_or_default(),
            enabled: true,
        }
    }

    fn closed() -> Self {
        Self {
            enabled: false,
            ..Self::open("00:00", "00:00")
        }
    }

    /// Whether `time` falls inside the open interval `[start, end)`.
    pub fn contains(&self, time: &SlotTime) -> bool {
        self.enabled && *time >= self.start && *time < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingHours {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WorkingHours {
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            monday: DaySchedule::open("08:00", "18:00"),
            tuesday: DaySchedule::open("08:00", "18:00"),
            wednesday: DaySchedule::open("08:00", "18:00"),
            thursday: DaySchedule::open("08:00", "18:00"),
            friday: DaySchedule::open("08:00", "18:00"),
            saturday: DaySchedule::open("09:00", "13:00"),
            sunday: DaySchedule::closed(),
        }
    }
}

/// How long before an appointment a reminder goes out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReminderTiming {
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "48h")]
    TwoDays,
}

impl ReminderTiming {
    pub fn hours(&self) -> i64 {
        match self {
            ReminderTiming::OneHour => 1,
            ReminderTiming::OneDay => 24,
            ReminderTiming::TwoDays => 48,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReminderTiming::OneHour => "1 heure avant",
            ReminderTiming::OneDay => "24 heures avant",
            ReminderTiming::TwoDays => "48 heures avant",
        }
    }
}

/// Reminder defaults. Templates accept `{patient}`, `{date}`, `{time}`,
/// `{cabinet}` and `{phone}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSettings {
    pub enabled: bool,
    pub default_type: ReminderChannel,
    pub default_timing: ReminderTiming,
    pub sms_template: String,
    pub whatsapp_template: String,
}

impl ReminderSettings {
    /// Template for `channel`. Email reuses the SMS text.
    pub fn template_for(&self, channel: ReminderChannel) -> &str {
        match channel {
            ReminderChannel::Whatsapp => &self.whatsapp_template,
            ReminderChannel::Sms | ReminderChannel::Email => &self.sms_template,
        }
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_type: ReminderChannel::Whatsapp,
            default_timing: ReminderTiming::OneDay,
            sms_template: "Rappel: RDV le {date} à {time}. {cabinet}".into(),
            whatsapp_template: "👋 Bonjour {patient}!\n📅 RDV: {date} à {time}\n📍 {cabinet}"
                .into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSettings {
    pub prefix: String,
    pub footer: String,
    pub bank_details: String,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            prefix: "FAC".into(),
            footer: "Merci de votre confiance.".into(),
            bank_details: "IBAN: MA00 0000 0000".into(),
        }
    }
}

/// The practice's settings. Missing fields in stored data take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CabinetConfig {
    pub name: String,
    pub subtitle: String,
    pub logo: Option<String>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub specialty: String,
    pub currency: String,
    /// Percentage applied to invoice subtotals
    pub tax_rate: f64,
    /// Default appointment length in minutes
    pub appointment_duration: u32,
    pub working_hours: WorkingHours,
    pub reminder_settings: ReminderSettings,
    pub invoice_settings: InvoiceSettings,
    pub stripe_enabled: bool,
    pub stripe_public_key: String,
    pub google_calendar_enabled: bool,
    pub google_calendar_id: String,
}

impl CabinetConfig {
    /// Invoice number prefix, falling back to `FAC` when blank.
    pub fn invoice_prefix(&self) -> &str {
        let prefix = self.invoice_settings.prefix.trim();
        if prefix.is_empty() {
            "FAC"
        } else {
            prefix
        }
    }

    /// Tax owed on `subtotal` at the configured rate.
    pub fn tax_on(&self, subtotal: f64) -> f64 {
        subtotal * (self.tax_rate / 100.0)
    }
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            name: "Cabinet MediPlan".into(),
            subtitle: "Excellence en soins de santé".into(),
            logo: None,
            address: "123 Avenue Mohammed V".into(),
            city: "Rabat".into(),
            postal_code: "10000".into(),
            country: "Maroc".into(),
            phone: "0537000000".into(),
            email: "contact@mediplan.ma".into(),
            website: "www.mediplan.ma".into(),
            specialty: "Orthophonie".into(),
            currency: "DH".into(),
            tax_rate: 0.0,
            appointment_duration: 30,
            working_hours: WorkingHours::default(),
            reminder_settings: ReminderSettings::default(),
            invoice_settings: InvoiceSettings::default(),
            stripe_enabled: false,
            stripe_public_key: String::new(),
            google_calendar_enabled: false,
            google_calendar_id: String::new(),
        }
    }
}

/// Top-level shallow patch: nested sections are replaced whole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CabinetConfigPatch {
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub logo: Option<Option<String>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub specialty: Option<String>,
    pub currency: Option<String>,
    pub tax_rate: Option<f64>,
    pub appointment_duration: Option<u32>,
    pub working_hours: Option<WorkingHours>,
    pub reminder_settings: Option<ReminderSettings>,
    pub invoice_settings: Option<InvoiceSettings>,
    pub stripe_enabled: Option<bool>,
    pub stripe_public_key: Option<String>,
    pub google_calendar_enabled: Option<bool>,
    pub google_calendar_id: Option<String>,
}

impl CabinetConfigPatch {
    pub fn apply_to(self, config: &mut CabinetConfig) {
        merge_fields!(self => config;
            name, subtitle, logo, address, city, postal_code, country, phone, email,
            website, specialty, currency, tax_rate, appointment_duration, working_hours,
            reminder_settings, invoice_settings, stripe_enabled, stripe_public_key,
            google_calendar_enabled, google_calendar_id,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CabinetConfig::default();
        assert_eq!(config.currency, "DH");
        assert_eq!(config.invoice_prefix(), "FAC");
        assert_eq!(config.reminder_settings.default_type, ReminderChannel::Whatsapp);
        assert!(!config.working_hours.sunday.enabled);
        assert_eq!(config.working_hours.saturday.end.as_str(), "13:00");
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: CabinetConfig =
            serde_json::from_str(r#"{"name":"Cabinet Errami","taxRate":20}"#).unwrap();
        assert_eq!(config.name, "Cabinet Errami");
        assert_eq!(config.tax_on(300.0), 60.0);
        assert_eq!(config.city, "Rabat");
    }

    #[test]
    fn test_patch_is_shallow() {
        let mut config = CabinetConfig::default();
        CabinetConfigPatch {
            phone: Some("0522000000".into()),
            invoice_settings: Some(InvoiceSettings {
                prefix: "  ".into(),
                footer: String::new(),
                bank_details: String::new(),
            }),
            ..Default::default()
        }
        .apply_to(&mut config);

        assert_eq!(config.phone, "0522000000");
        assert_eq!(config.invoice_settings.footer, "");
        assert_eq!(config.invoice_prefix(), "FAC");
        assert_eq!(config.name, "Cabinet MediPlan");
    }

    #[test]
    fn test_day_schedule_contains() {
        let hours = WorkingHours::default();
        let nine = SlotTime::parse("09:00").unwrap();
        let six_pm = SlotTime::parse("18:00").unwrap();
        assert!(hours.day(Weekday::Mon).contains(&nine));
        assert!(!hours.day(Weekday::Mon).contains(&six_pm));
        assert!(!hours.day(Weekday::Sun).contains(&nine));
    }

    #[test]
    fn test_reminder_timing_wire_values() {
        assert_eq!(serde_json::to_string(&ReminderTiming::TwoDays).unwrap(), r#""48h""#);
        assert_eq!(ReminderTiming::OneDay.hours(), 24);
    }
}
