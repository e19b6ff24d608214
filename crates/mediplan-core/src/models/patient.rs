//! Patient models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Reminder delivery channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderChannel {
    #[default]
    Sms,
    Whatsapp,
    Email,
}

impl ReminderChannel {
    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Sms => "sms",
            ReminderChannel::Whatsapp => "whatsapp",
            ReminderChannel::Email => "email",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            ReminderChannel::Sms => "SMS",
            ReminderChannel::Whatsapp => "WhatsApp",
            ReminderChannel::Email => "Email",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "Homme")]
    Male,
    #[serde(rename = "Femme")]
    Female,
}

/// Person to call in an emergency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relation: String,
}

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Unique id, assigned at creation
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    /// Supplementary insurance provider
    #[serde(default)]
    pub mutuelle: String,
    #[serde(default)]
    pub mutuelle_number: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub notes: String,
    /// Embedded photo (data URL), opaque to the store
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub photo: Option<String>,
    /// Creation date
    pub created_at: NaiveDate,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub last_visit: Option<NaiveDate>,
    #[serde(default)]
    pub total_visits: u32,
    /// Outstanding balance (may be negative for credit)
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub preferred_reminder: ReminderChannel,
}

impl Patient {
    /// Build a patient from creation input, stamping system-assigned fields.
    pub fn new(input: NewPatient, created_at: NaiveDate) -> Self {
        Self {
            id: super::new_id(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            address: input.address,
            city: input.city,
            postal_code: input.postal_code,
            mutuelle: input.mutuelle,
            mutuelle_number: input.mutuelle_number,
            blood_type: input.blood_type,
            allergies: dedup_tags(input.allergies),
            chronic_conditions: dedup_tags(input.chronic_conditions),
            emergency_contact: input.emergency_contact,
            notes: input.notes,
            photo: input.photo,
            created_at,
            last_visit: None,
            total_visits: 0,
            balance: 0.0,
            preferred_reminder: input.preferred_reminder,
        }
    }

    /// "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Age in whole years on `today`, if the date of birth is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth.map(|dob| calculate_age(dob, today))
    }
}

/// Caller input for creating a patient.
///
/// Carries no id, creation date, visit counter or balance: those are always
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub gender: Option<Gender>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub mutuelle: String,
    pub mutuelle_number: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub emergency_contact: EmergencyContact,
    pub notes: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub photo: Option<String>,
    pub preferred_reminder: ReminderChannel,
}

impl NewPatient {
    /// Minimal input with just a name.
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a patient. `None` leaves the field unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub gender: Option<Option<Gender>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub mutuelle: Option<String>,
    pub mutuelle_number: Option<String>,
    pub blood_type: Option<Option<String>>,
    pub allergies: Option<Vec<String>>,
    pub chronic_conditions: Option<Vec<String>>,
    pub emergency_contact: Option<EmergencyContact>,
    pub notes: Option<String>,
    pub photo: Option<Option<String>>,
    pub last_visit: Option<Option<NaiveDate>>,
    pub total_visits: Option<u32>,
    pub balance: Option<f64>,
    pub preferred_reminder: Option<ReminderChannel>,
}

impl PatientPatch {
    /// Apply onto an existing patient.
    pub fn apply_to(mut self, patient: &mut Patient) {
        if let Some(allergies) = self.allergies.take() {
            patient.allergies = dedup_tags(allergies);
        }
        if let Some(conditions) = self.chronic_conditions.take() {
            patient.chronic_conditions = dedup_tags(conditions);
        }
        merge_fields!(self => patient;
            first_name, last_name, email, phone, date_of_birth, gender,
            address, city, postal_code, mutuelle, mutuelle_number, blood_type,
            emergency_contact, notes, photo, last_visit, total_visits, balance,
            preferred_reminder,
        );
    }
}

/// Whole years between `dob` and `today`.
pub fn calculate_age(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Group a 10-digit phone number as `06 61 23 45 67`; other inputs are returned as-is.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 10 {
        return phone.to_string();
    }
    format!(
        "{} {} {} {} {}",
        &digits[0..2],
        &digits[2..4],
        &digits[4..6],
        &digits[6..8],
        &digits[8..10]
    )
}

/// Trim, drop empties and duplicates, keep first-seen order.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
