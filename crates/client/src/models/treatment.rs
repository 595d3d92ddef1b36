use super::null_as_default;
use super::{Media, Patient};
use crate::ClientError;
use chrono::{DateTime, Utc};
use cms_types::{DocumentId, EntryId};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Anatomical site a treatment (or one lesion within it) addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreatmentTarget {
    Maxillofacial,
    Chest,
    #[serde(rename = "Abdomen & Buttocks")]
    AbdomenAndButtocks,
    #[serde(rename = "Shoulder & Back")]
    ShoulderAndBack,
    Limbs,
    #[serde(rename = "Whole Body")]
    WholeBody,
    #[serde(rename = "Multiple Sites")]
    MultipleSites,
}

impl TreatmentTarget {
    pub const ALL: [TreatmentTarget; 7] = [
        TreatmentTarget::Maxillofacial,
        TreatmentTarget::Chest,
        TreatmentTarget::AbdomenAndButtocks,
        TreatmentTarget::ShoulderAndBack,
        TreatmentTarget::Limbs,
        TreatmentTarget::WholeBody,
        TreatmentTarget::MultipleSites,
    ];

    /// Value stored by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentTarget::Maxillofacial => "Maxillofacial",
            TreatmentTarget::Chest => "Chest",
            TreatmentTarget::AbdomenAndButtocks => "Abdomen & Buttocks",
            TreatmentTarget::ShoulderAndBack => "Shoulder & Back",
            TreatmentTarget::Limbs => "Limbs",
            TreatmentTarget::WholeBody => "Whole Body",
            TreatmentTarget::MultipleSites => "Multiple Sites",
        }
    }

    /// Label shown to ward staff.
    pub fn label(self) -> &'static str {
        match self {
            TreatmentTarget::Maxillofacial => "颌面部",
            TreatmentTarget::Chest => "胸部",
            TreatmentTarget::AbdomenAndButtocks => "腹部与臀部",
            TreatmentTarget::ShoulderAndBack => "肩背部",
            TreatmentTarget::Limbs => "四肢",
            TreatmentTarget::WholeBody => "全身",
            TreatmentTarget::MultipleSites => "多部位",
        }
    }
}

impl fmt::Display for TreatmentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreatmentTarget {
    type Err = ClientError;

    /// Accepts the stored value (case-insensitive) or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TreatmentTarget::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.label() == s)
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown treatment site '{s}'")))
    }
}

/// One lesion within a treatment: the site, notes, and its photos.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreatmentDetail {
    #[serde(default)]
    pub part: Option<TreatmentTarget>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Minutes spent on this site.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photos: Vec<Media>,
}

/// Treatment record as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(default)]
    pub id: Option<EntryId>,
    #[serde(rename = "documentId")]
    pub document_id: DocumentId,
    #[serde(rename = "treatmentNo", default)]
    pub treatment_no: Option<String>,
    #[serde(default)]
    pub target: Option<TreatmentTarget>,
    #[serde(default)]
    pub sequence_number: Option<u32>,
    /// Total minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub patient: Option<Patient>,
    #[serde(rename = "Images", default, deserialize_with = "null_as_default")]
    pub images: Vec<Media>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub details: Vec<TreatmentDetail>,
}

impl Treatment {
    /// Every photo attached to the record, top-level images first, then per-lesion photos in
    /// lesion order.
    pub fn all_photos(&self) -> impl Iterator<Item = &Media> {
        self.images
            .iter()
            .chain(self.details.iter().flat_map(|d| d.photos.iter()))
    }
}

/// One lesion in a treatment create or update. Photos are linked by the numeric id the upload
/// endpoint returned.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreatmentDetailInput {
    pub part: TreatmentTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub photos: Vec<EntryId>,
}

/// Fields a treatment create or update may send.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreatmentInput {
    /// Owning patient, connected by document id.
    pub patient: DocumentId,
    #[serde(rename = "treatmentNo", skip_serializing_if = "Option::is_none")]
    pub treatment_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TreatmentTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "Images", skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<EntryId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<TreatmentDetailInput>,
}

impl TreatmentInput {
    pub fn new(patient: DocumentId) -> Self {
        Self {
            patient,
            treatment_no: None,
            target: None,
            sequence_number: None,
            duration: None,
            images: Vec::new(),
            details: Vec::new(),
        }
    }
}
