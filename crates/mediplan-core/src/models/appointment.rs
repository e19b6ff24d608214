//! Appointment models and the appointment-type catalog.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PaymentMethod, ReminderChannel};

/// Local time of day stored as zero-padded `HH:MM`.
///
/// String order equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(String);

impl SlotTime {
    /// Parse `HH:MM` or `H:MM`, normalizing to zero-padded form.
    pub fn parse(s: &str) -> Result<Self, String> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Invalid time: '{}'", s))?;
        let hour: u32 = h.parse().map_err(|_| format!("Invalid hour in '{}'", s))?;
        let minute: u32 = m.parse().map_err(|_| format!("Invalid minute in '{}'", s))?;
        if m.len() != 2 || hour > 23 || minute > 59 {
            return Err(format!("Invalid time: '{}'", s));
        }
        Ok(Self(format!("{:02}:{:02}", hour, minute)))
    }

    /// Build from components. Out-of-range values are rejected.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, String> {
        Self::parse(&format!("{}:{:02}", hour, minute))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // Constructed through `parse`, so the format always matches.
        NaiveTime::parse_from_str(&self.0, "%H:%M").unwrap_or(NaiveTime::MIN)
    }
}

impl Default for SlotTime {
    /// Midnight.
    fn default() -> Self {
        Self("00:00".to_string())
    }
}

impl TryFrom<String> for SlotTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SlotTime::parse(&value)
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate bookable slots from `start_hour` (inclusive) to `end_hour`
/// (exclusive) every `interval` minutes.
pub fn generate_time_slots(start_hour: u32, end_hour: u32, interval: u32) -> Vec<SlotTime> {
    let interval = interval.clamp(1, 60);
    let mut slots = Vec::new();
    for hour in start_hour..end_hour.min(24) {
        let mut minute = 0;
        while minute < 60 {
            if let Ok(slot) = SlotTime::from_hm(hour, minute) {
                slots.push(slot);
            }
            minute += interval;
        }
    }
    slots
}

/// Kind of visit. Each carries a default duration and fee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    #[serde(rename = "consultation")]
    Consultation,
    #[serde(rename = "suivi")]
    FollowUp,
    #[serde(rename = "urgence")]
    Emergency,
    #[serde(rename = "bilan")]
    Assessment,
    #[serde(rename = "teleconsultation")]
    Teleconsultation,
    #[serde(rename = "reeducation")]
    Rehabilitation,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 6] = [
        AppointmentType::Consultation,
        AppointmentType::FollowUp,
        AppointmentType::Emergency,
        AppointmentType::Assessment,
        AppointmentType::Teleconsultation,
        AppointmentType::Rehabilitation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "Consultation",
            AppointmentType::FollowUp => "Suivi",
            AppointmentType::Emergency => "Urgence",
            AppointmentType::Assessment => "Bilan initial",
            AppointmentType::Teleconsultation => "Téléconsultation",
            AppointmentType::Rehabilitation => "Rééducation",
        }
    }

    /// Default duration in minutes.
    pub fn default_duration(&self) -> u32 {
        match self {
            AppointmentType::Consultation => 30,
            AppointmentType::FollowUp => 20,
            AppointmentType::Emergency => 15,
            AppointmentType::Assessment => 60,
            AppointmentType::Teleconsultation => 20,
            AppointmentType::Rehabilitation => 45,
        }
    }

    /// Default fee in the cabinet currency.
    pub fn default_fee(&self) -> f64 {
        match self {
            AppointmentType::Consultation => 400.0,
            AppointmentType::FollowUp => 300.0,
            AppointmentType::Emergency => 500.0,
            AppointmentType::Assessment => 600.0,
            AppointmentType::Teleconsultation => 350.0,
            AppointmentType::Rehabilitation => 450.0,
        }
    }
}

/// Appointment lifecycle.
///
/// Main line: `planifie → confirme → rappel_envoye → present → en_cours → termine`.
/// `absent` and `annule` branch off any non-terminal state. The store does not
/// enforce transitions; [`AppointmentStatus::can_transition_to`] describes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum AppointmentStatus {
    #[default]
    #[serde(rename = "planifie")]
    Planned,
    #[serde(rename = "confirme")]
    Confirmed,
    #[serde(rename = "rappel_envoye")]
    ReminderSent,
    #[serde(rename = "present")]
    Present,
    #[serde(rename = "en_cours")]
    InProgress,
    #[serde(rename = "termine")]
    Completed,
    #[serde(rename = "absent")]
    Absent,
    #[serde(rename = "annule")]
    Cancelled,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Planned => "Planifié",
            AppointmentStatus::Confirmed => "Confirmé",
            AppointmentStatus::ReminderSent => "Rappel envoyé",
            AppointmentStatus::Present => "Présent",
            AppointmentStatus::InProgress => "En cours",
            AppointmentStatus::Completed => "Terminé",
            AppointmentStatus::Absent => "Absent",
            AppointmentStatus::Cancelled => "Annulé",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Absent | AppointmentStatus::Cancelled
        )
    }

    /// Counts as an upcoming visit.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Next step on the main line, if any.
    pub fn next(&self) -> Option<AppointmentStatus> {
        match self {
            AppointmentStatus::Planned => Some(AppointmentStatus::Confirmed),
            AppointmentStatus::Confirmed => Some(AppointmentStatus::ReminderSent),
            AppointmentStatus::ReminderSent => Some(AppointmentStatus::Present),
            AppointmentStatus::Present => Some(AppointmentStatus::InProgress),
            AppointmentStatus::InProgress => Some(AppointmentStatus::Completed),
            _ => None,
        }
    }

    /// Transitions the workflow describes from this state.
    pub fn allowed_transitions(&self) -> Vec<AppointmentStatus> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut out: Vec<AppointmentStatus> = self.next().into_iter().collect();
        out.push(AppointmentStatus::Absent);
        out.push(AppointmentStatus::Cancelled);
        out
    }

    pub fn can_transition_to(&self, to: AppointmentStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// A scheduled visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub practitioner_id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    /// Minutes
    pub duration: u32,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    pub fee: f64,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub reminder_type: Option<ReminderChannel>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub created_by: Option<String>,
}

impl Appointment {
    /// Build from scheduling input. Status always starts at `planifie`.
    pub fn new(
        input: NewAppointment,
        reminder_type: ReminderChannel,
        created_at: DateTime<Utc>,
        created_by: Option<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            patient_id: input.patient_id,
            practitioner_id: input.practitioner_id,
            date: input.date,
            time: input.time,
            duration: input.duration.unwrap_or_else(|| input.kind.default_duration()),
            kind: input.kind,
            status: AppointmentStatus::Planned,
            notes: input.notes,
            fee: input.fee.unwrap_or_else(|| input.kind.default_fee()),
            paid: false,
            payment_method: None,
            paid_at: None,
            reminder_sent: false,
            reminder_type: Some(reminder_type),
            created_at: Some(created_at),
            created_by,
        }
    }

    /// Start as a local datetime.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.to_naive_time())
    }
}

/// Caller input for scheduling an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub practitioner_id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    /// Defaults to the type's duration
    #[serde(default)]
    pub duration: Option<u32>,
    /// Defaults to the type's fee
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub notes: String,
    /// Defaults to the patient's preferred channel
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub reminder_type: Option<ReminderChannel>,
}

/// Partial update for an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentPatch {
    pub patient_id: Option<String>,
    pub practitioner_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<SlotTime>,
    pub duration: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<AppointmentType>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub fee: Option<f64>,
    pub paid: Option<bool>,
    pub payment_method: Option<Option<PaymentMethod>>,
    pub paid_at: Option<Option<DateTime<Utc>>>,
    pub reminder_sent: Option<bool>,
    pub reminder_type: Option<Option<ReminderChannel>>,
}

impl AppointmentPatch {
    /// Status-only patch.
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply_to(self, appointment: &mut Appointment) {
        merge_fields!(self => appointment;
            patient_id, practitioner_id, date, time, duration, kind, status, notes,
            fee, paid, payment_method, paid_at, reminder_sent, reminder_type,
        );
    }
}
