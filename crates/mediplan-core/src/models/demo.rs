//! Built-in demonstration data used for first-run seeding.

use chrono::NaiveDate;

use super::*;
use crate::auth::hash_password;

/// A complete set of collections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemoData {
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub medical_records: Vec<MedicalRecord>,
    pub invoices: Vec<Invoice>,
    pub users: Vec<User>,
    pub cabinet: CabinetConfig,
}

impl DemoData {
    /// Empty collections with the default cabinet settings.
    pub fn blank() -> Self {
        Self::default()
    }

    /// The demo practice: four patients, six appointments, three records,
    /// two paid invoices and three staff accounts.
    pub fn seed() -> Self {
        Self {
            patients: demo_patients(),
            appointments: demo_appointments(),
            medical_records: demo_records(),
            invoices: demo_invoices(),
            users: demo_users(),
            cabinet: CabinetConfig::default(),
        }
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn slot(s: &str) -> SlotTime {
    SlotTime::parse(s).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn patient(
    id: &str,
    name: (&str, &str),
    email: &str,
    phone: &str,
    dob: NaiveDate,
    gender: Gender,
    address: (&str, &str, &str),
    mutuelle: (&str, &str),
    blood_type: &str,
    allergies: &[&str],
    conditions: &[&str],
    emergency: (&str, &str, &str),
    notes: &str,
    created_at: NaiveDate,
    last_visit: NaiveDate,
    total_visits: u32,
    balance: f64,
    preferred_reminder: ReminderChannel,
) -> Patient {
    Patient {
        id: id.into(),
        first_name: name.0.into(),
        last_name: name.1.into(),
        email: email.into(),
        phone: phone.into(),
        date_of_birth: Some(dob),
        gender: Some(gender),
        address: address.0.into(),
        city: address.1.into(),
        postal_code: address.2.into(),
        mutuelle: mutuelle.0.into(),
        mutuelle_number: mutuelle.1.into(),
        blood_type: Some(blood_type.into()),
        allergies: allergies.iter().map(|s| s.to_string()).collect(),
        chronic_conditions: conditions.iter().map(|s| s.to_string()).collect(),
        emergency_contact: EmergencyContact {
            name: emergency.0.into(),
            phone: emergency.1.into(),
            relation: emergency.2.into(),
        },
        notes: notes.into(),
        photo: None,
        created_at,
        last_visit: Some(last_visit),
        total_visits,
        balance,
        preferred_reminder,
    }
}

fn demo_patients() -> Vec<Patient> {
    vec![
        patient(
            "p1",
            ("Ahmed", "El Mansouri"),
            "ahmed.elmansouri@email.com",
            "0677889900",
            day(1988, 3, 15),
            Gender::Male,
            ("12 Rue Mohammed V", "Rabat", "10000"),
            ("CNOPS", "CNOPS-123456"),
            "A+",
            &["Pénicilline"],
            &["Hypertension légère"],
            ("Fatima El Mansouri", "0677889901", "Épouse"),
            "Patient régulier",
            day(2024, 1, 10),
            day(2025, 1, 10),
            12,
            150.0,
            ReminderChannel::Whatsapp,
        ),
        patient(
            "p2",
            ("Khadija", "Ouazzani"),
            "khadija.ouazzani@email.com",
            "0655443322",
            day(1976, 8, 22),
            Gender::Female,
            ("45 Avenue Hassan II", "Casablanca", "20000"),
            ("CNSS", "CNSS-789012"),
            "O+",
            &[],
            &[],
            ("Omar Ouazzani", "0655443323", "Époux"),
            "",
            day(2024, 3, 20),
            day(2025, 1, 8),
            24,
            0.0,
            ReminderChannel::Sms,
        ),
        patient(
            "p3",
            ("Youssef", "Tazi"),
            "parent.tazi@email.com",
            "0699887766",
            day(2018, 11, 30),
            Gender::Male,
            ("8 Rue Ibn Sina", "Marrakech", "40000"),
            ("Assurance privée", "PRV-345678"),
            "B+",
            &["Arachides"],
            &[],
            ("Mohammed Tazi", "0699887767", "Père"),
            "Enfant - Suivi orthophonique",
            day(2024, 6, 15),
            day(2025, 1, 10),
            18,
            200.0,
            ReminderChannel::Whatsapp,
        ),
        patient(
            "p4",
            ("Salma", "Chraibi"),
            "salma.chraibi@email.com",
            "0611223344",
            day(1995, 5, 12),
            Gender::Female,
            ("23 Boulevard Zerktouni", "Casablanca", "20100"),
            ("CNOPS", "CNOPS-567890"),
            "AB+",
            &[],
            &["Asthme léger"],
            ("Rachid Chraibi", "0611223345", "Frère"),
            "",
            day(2024, 9, 1),
            day(2025, 1, 5),
            6,
            0.0,
            ReminderChannel::Email,
        ),
    ]
}

struct Visit<'a> {
    id: &'a str,
    patient: &'a str,
    practitioner: &'a str,
    date: NaiveDate,
    time: &'a str,
    duration: u32,
    kind: AppointmentType,
    status: AppointmentStatus,
    notes: &'a str,
    reminder_sent: bool,
    reminder: Option<ReminderChannel>,
    payment: Option<(PaymentMethod, &'a str)>,
}

impl Visit<'_> {
    fn build(self) -> Appointment {
        let (payment_method, paid_at) = match self.payment {
            Some((method, at)) => (Some(method), parse_timestamp(at)),
            None => (None, None),
        };
        Appointment {
            id: self.id.into(),
            patient_id: self.patient.into(),
            practitioner_id: self.practitioner.into(),
            date: self.date,
            time: slot(self.time),
            duration: self.duration,
            kind: self.kind,
            status: self.status,
            notes: self.notes.into(),
            fee: self.kind.default_fee(),
            paid: payment_method.is_some(),
            payment_method,
            paid_at,
            reminder_sent: self.reminder_sent,
            reminder_type: self.reminder,
            created_at: None,
            created_by: None,
        }
    }
}

fn demo_appointments() -> Vec<Appointment> {
    use AppointmentStatus::*;
    use AppointmentType::*;

    let visits = [
        Visit {
            id: "a1",
            patient: "p1",
            practitioner: "u2",
            date: day(2025, 1, 13),
            time: "09:00",
            duration: 30,
            kind: FollowUp,
            status: Confirmed,
            notes: "Séance de rééducation vocale",
            reminder_sent: true,
            reminder: Some(ReminderChannel::Whatsapp),
            payment: None,
        },
        Visit {
            id: "a2",
            patient: "p2",
            practitioner: "u2",
            date: day(2025, 1, 13),
            time: "10:00",
            duration: 30,
            kind: Consultation,
            status: Planned,
            notes: "",
            reminder_sent: false,
            reminder: Some(ReminderChannel::Sms),
            payment: None,
        },
        Visit {
            id: "a3",
            patient: "p3",
            practitioner: "u1",
            date: day(2025, 1, 13),
            time: "11:00",
            duration: 45,
            kind: Rehabilitation,
            status: Confirmed,
            notes: "Séance orthophonique",
            reminder_sent: true,
            reminder: Some(ReminderChannel::Whatsapp),
            payment: None,
        },
        Visit {
            id: "a4",
            patient: "p4",
            practitioner: "u2",
            date: day(2025, 1, 14),
            time: "14:00",
            duration: 60,
            kind: Assessment,
            status: Planned,
            notes: "Bilan initial",
            reminder_sent: false,
            reminder: Some(ReminderChannel::Email),
            payment: None,
        },
        Visit {
            id: "a5",
            patient: "p1",
            practitioner: "u2",
            date: day(2025, 1, 10),
            time: "09:30",
            duration: 30,
            kind: FollowUp,
            status: Completed,
            notes: "Bonne progression",
            reminder_sent: true,
            reminder: None,
            payment: Some((PaymentMethod::Card, "2025-01-10T10:05:00")),
        },
        Visit {
            id: "a6",
            patient: "p2",
            practitioner: "u1",
            date: day(2025, 1, 9),
            time: "14:00",
            duration: 30,
            kind: Consultation,
            status: Completed,
            notes: "",
            reminder_sent: true,
            reminder: None,
            payment: Some((PaymentMethod::Cash, "2025-01-09T14:35:00")),
        },
    ];

    visits.into_iter().map(Visit::build).collect()
}

fn record(
    id: &str,
    patient_id: &str,
    kind: RecordType,
    title: &str,
    content: &str,
    date: NaiveDate,
    created_by: &str,
) -> MedicalRecord {
    MedicalRecord {
        id: id.into(),
        patient_id: patient_id.into(),
        kind,
        title: title.into(),
        content: content.into(),
        date,
        created_by: Some(created_by.into()),
        attachments: Vec::new(),
    }
}

fn demo_records() -> Vec<MedicalRecord> {
    vec![
        record(
            "mr1",
            "p1",
            RecordType::ConsultationNote,
            "Consultation initiale",
            "Patient présentant une dysphonie fonctionnelle. Voix rauque depuis 3 mois.",
            day(2024, 1, 10),
            "u2",
        ),
        record(
            "mr2",
            "p1",
            RecordType::Report,
            "Bilan orthophonique",
            "Score VHI: 45/120. Diagnostic: dysphonie fonctionnelle modérée.",
            day(2024, 1, 15),
            "u2",
        ),
        record(
            "mr3",
            "p3",
            RecordType::ConsultationNote,
            "Première consultation",
            "Enfant de 6 ans présentant un retard de langage.",
            day(2024, 6, 15),
            "u1",
        ),
    ]
}

fn paid_invoice(
    id: &str,
    number: &str,
    patient_id: &str,
    appointment_id: &str,
    date: NaiveDate,
    item: InvoiceItem,
    method: PaymentMethod,
    paid_at: &str,
) -> Invoice {
    let mut invoice = Invoice {
        id: id.into(),
        number: number.into(),
        patient_id: patient_id.into(),
        appointment_id: Some(appointment_id.into()),
        date,
        items: vec![item],
        subtotal: 0.0,
        tax: 0.0,
        total: 0.0,
        status: InvoiceStatus::Paid,
        payment_method: Some(method),
        paid_at: parse_timestamp(paid_at),
        notes: String::new(),
        created_at: None,
        created_by: None,
    };
    invoice.recompute_totals();
    invoice
}

fn demo_invoices() -> Vec<Invoice> {
    vec![
        paid_invoice(
            "inv1",
            "FAC-2025-001",
            "p1",
            "a5",
            day(2025, 1, 10),
            InvoiceItem::new("Séance de suivi", 1, 300.0),
            PaymentMethod::Card,
            "2025-01-10T10:05:00",
        ),
        paid_invoice(
            "inv2",
            "FAC-2025-002",
            "p2",
            "a6",
            day(2025, 1, 9),
            InvoiceItem::new("Consultation", 1, 400.0),
            PaymentMethod::Cash,
            "2025-01-09T14:35:00",
        ),
    ]
}

fn demo_users() -> Vec<User> {
    let staff = [
        ("u1", "admin@mediplan.ma", "admin123", "Dr. Fatima Alaoui", Role::Admin, "0661234567", Some("Orthophonie")),
        ("u2", "dr.sarah@mediplan.ma", "sarah123", "Dr. Sarah Bennani", Role::Practitioner, "0662345678", Some("Orthophonie")),
        ("u3", "secretaire@mediplan.ma", "sec123", "Amal Tazi", Role::Secretary, "0663456789", None),
    ];
    staff
        .into_iter()
        .map(|(id, email, password, name, role, phone, specialty)| User {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            password_hash: hash_password(password),
            role,
            phone: phone.into(),
            specialty: specialty.map(str::to_string),
            is_active: true,
            created_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;

    #[test]
    fn test_seed_sizes() {
        let demo = DemoData::seed();
        assert_eq!(demo.patients.len(), 4);
        assert_eq!(demo.appointments.len(), 6);
        assert_eq!(demo.medical_records.len(), 3);
        assert_eq!(demo.invoices.len(), 2);
        assert_eq!(demo.users.len(), 3);
    }

    #[test]
    fn test_seed_is_referentially_sound() {
        let demo = DemoData::seed();
        let has_patient = |id: &str| demo.patients.iter().any(|p| p.id == id);
        assert!(demo.appointments.iter().all(|a| has_patient(&a.patient_id)));
        assert!(demo.medical_records.iter().all(|r| has_patient(&r.patient_id)));
        assert!(demo.invoices.iter().all(|i| has_patient(&i.patient_id) && i.is_consistent()));
    }

    #[test]
    fn test_seed_passwords_are_hashed() {
        let demo = DemoData::seed();
        let admin = demo.users.iter().find(|u| u.id == "u1").unwrap();
        assert!(admin.password_hash.starts_with("sha256$"));
        assert!(verify_password("admin123", &admin.password_hash));
    }

    #[test]
    fn test_seed_appointments() {
        let demo = DemoData::seed();
        let a5 = demo.appointments.iter().find(|a| a.id == "a5").unwrap();
        assert!(a5.paid);
        assert!(a5.reminder_sent);
        assert_eq!(a5.fee, 300.0);
        let a2 = demo.appointments.iter().find(|a| a.id == "a2").unwrap();
        assert!(!a2.reminder_sent);
        assert_eq!(a2.reminder_type, Some(ReminderChannel::Sms));
        assert_eq!(a2.time.as_str(), "10:00");
    }

    #[test]
    fn test_blank_is_empty() {
        let blank = DemoData::blank();
        assert!(blank.patients.is_empty());
        assert_eq!(blank.cabinet, CabinetConfig::default());
    }
}
