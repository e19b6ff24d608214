//! Medical record models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    ConsultationNote,
    Prescription,
    LabResult,
    Imaging,
    Report,
    Certificate,
}

impl RecordType {
    pub fn label(&self) -> &'static str {
        match self {
            RecordType::ConsultationNote => "Note de consultation",
            RecordType::Prescription => "Ordonnance",
            RecordType::LabResult => "Analyse",
            RecordType::Imaging => "Imagerie",
            RecordType::Report => "Compte-rendu",
            RecordType::Certificate => "Certificat",
        }
    }
}

/// File attached to a record. `data` is an opaque text encoding of the bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Creation date; never changed by updates
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MedicalRecord {
    pub fn new(input: NewMedicalRecord, date: NaiveDate, created_by: Option<String>) -> Self {
        Self {
            id: super::new_id(),
            patient_id: input.patient_id,
            kind: input.kind,
            title: input.title.trim().to_string(),
            content: input.content,
            date,
            created_by,
            attachments: input.attachments,
        }
    }
}

/// Caller input for a new record. The date and author are stamped by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub patient_id: String,
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Partial update. The creation date and owning patient are not patchable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalRecordPatch {
    #[serde(rename = "type")]
    pub kind: Option<RecordType>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

impl MedicalRecordPatch {
    pub fn apply_to(self, record: &mut MedicalRecord) {
        merge_fields!(self => record; kind, title, content, attachments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_format() {
        let record = MedicalRecord::new(
            NewMedicalRecord {
                patient_id: "p1".into(),
                kind: RecordType::LabResult,
                title: " Bilan sanguin ".into(),
                content: "RAS".into(),
                attachments: vec![Attachment {
                    name: "nfs.pdf".into(),
                    mime_type: "application/pdf".into(),
                    data: "data:application/pdf;base64,AAAA".into(),
                }],
            },
            NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
            Some("u2".into()),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "lab_result");
        assert_eq!(json["title"], "Bilan sanguin");
        assert_eq!(json["attachments"][0]["type"], "application/pdf");
        assert_eq!(json["createdBy"], "u2");
    }

    #[test]
    fn test_patch_keeps_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut record = MedicalRecord::new(
            NewMedicalRecord {
                patient_id: "p1".into(),
                kind: RecordType::ConsultationNote,
                title: "Consultation initiale".into(),
                content: String::new(),
                attachments: Vec::new(),
            },
            date,
            None,
        );

        // `date` in the payload is not a patch field and is ignored.
        let patch: MedicalRecordPatch =
            serde_json::from_str(r#"{"content":"Voix rauque","date":"2030-01-01"}"#).unwrap();
        patch.apply_to(&mut record);

        assert_eq!(record.content, "Voix rauque");
        assert_eq!(record.date, date);
        assert_eq!(record.patient_id, "p1");
    }

    #[test]
    fn test_record_type_labels() {
        assert_eq!(RecordType::Prescription.label(), "Ordonnance");
        let kind: RecordType = serde_json::from_str(r#""consultation_note""#).unwrap();
        assert_eq!(kind, RecordType::ConsultationNote);
    }
}
