use super::null_as_default;
use super::TreatmentTarget;
use crate::ClientError;
use chrono::{DateTime, NaiveDate, Utc};
use cms_types::{DocumentId, EntryId, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(ClientError::InvalidInput(format!(
                "gender must be male or female, got '{other}'"
            ))),
        }
    }
}

/// Treatment fields expanded on a patient for list display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreatmentSummary {
    #[serde(rename = "documentId", default)]
    pub document_id: Option<DocumentId>,
    #[serde(rename = "treatmentNo", default)]
    pub treatment_no: Option<String>,
    #[serde(default)]
    pub target: Option<TreatmentTarget>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Patient record as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub id: Option<EntryId>,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    #[serde(rename = "Name", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "Gender", default)]
    pub gender: Option<Gender>,
    #[serde(rename = "Birthday", default)]
    pub birthday: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub past_treatments: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub treatments: Vec<TreatmentSummary>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    /// Most recent treatment by creation time.
    pub fn latest_treatment(&self) -> Option<&TreatmentSummary> {
        self.treatments
            .iter()
            .filter(|t| t.created_at.is_some())
            .max_by_key(|t| t.created_at)
            .or_else(|| self.treatments.first())
    }
}

/// Fields a patient create or update may send.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientInput {
    #[serde(rename = "Name")]
    pub name: NonEmptyText,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Birthday", skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    pub past_treatments: Vec<String>,
}

impl PatientInput {
    pub fn new(name: NonEmptyText, gender: Gender) -> Self {
        Self {
            name,
            gender,
            birthday: None,
            past_treatments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_listed_patient_with_expanded_treatments() {
        let patient: Patient = serde_json::from_value(json!({
            "id": 12,
            "documentId": "pq7z0w3x",
            "Name": "王五",
            "Gender": "female",
            "Birthday": "1990-01-01",
            "past_treatments": null,
            "treatments": [
                { "documentId": "t1aa", "treatmentNo": "T-001", "target": "Chest",
                  "createdAt": "2025-12-01T08:00:00.000Z" },
                { "documentId": "t2bb", "treatmentNo": "T-002", "target": "Limbs",
                  "createdAt": "2025-12-30T08:00:00.000Z" }
            ],
            "createdAt": "2025-11-01T08:00:00.000Z",
            "updatedAt": "2025-12-30T09:00:00.000Z"
        }))
        .expect("decode patient");

        assert_eq!(patient.document_id.as_str(), "pq7z0w3x");
        assert_eq!(patient.gender, Some(Gender::Female));
        assert!(patient.past_treatments.is_empty());
        assert_eq!(
            patient.latest_treatment().and_then(|t| t.treatment_no.as_deref()),
            Some("T-002")
        );
    }

    #[test]
    fn input_never_carries_identifiers_or_relations() {
        let mut input = PatientInput::new(NonEmptyText::new("李四").unwrap(), Gender::Male);
        input.birthday = NaiveDate::from_ymd_opt(1985, 6, 15);
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(
            body,
            json!({
                "Name": "李四",
                "Gender": "male",
                "Birthday": "1985-06-15",
                "past_treatments": []
            })
        );
    }

    #[test]
    fn gender_parses_short_forms() {
        assert_eq!("F".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" male ".parse::<Gender>().unwrap(), Gender::Male);
        assert!("other".parse::<Gender>().is_err());
    }
}
