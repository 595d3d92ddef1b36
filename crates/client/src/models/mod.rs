//! Wire models for CMS entities.
//!
//! Field names follow the backend schema, including its mixed casing (`Name`, `Gender`,
//! `Birthday`, `Images`, `sequence_number`). Read models are lenient: nullable or absent
//! collections decode as empty. Write models (`*Input`) carry only the fields a create or
//! update may send, so identifiers and expanded relations can never leak into a payload.

mod media;
mod patient;
mod treatment;

pub use media::{ImageFormat, ImageSize, Media, MediaFormats};
pub use patient::{Gender, Patient, PatientInput, TreatmentSummary};
pub use treatment::{
    Treatment, TreatmentDetail, TreatmentDetailInput, TreatmentInput, TreatmentTarget,
};

use serde::{Deserialize, Deserializer};

/// Decodes `null` as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
