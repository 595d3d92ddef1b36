//! # CMS Client
//!
//! Typed client for the hospital treatment-tracking CMS.
//!
//! This crate owns everything that talks to the backend:
//! - startup configuration ([`config`]) and the error model ([`error`])
//! - session token persistence and login ([`auth`])
//! - the HTTP and upload collaborators behind the [`Transport`] and [`Uploader`] traits, with a
//!   reqwest implementation in [`http`]
//! - entity services for patients, treatments and uploads
//! - the bulk seeding workload ([`seed`])
//!
//! Query shaping and response normalisation live in `cms-query`; this crate only decides which
//! defaults each resource uses and decodes the results into [`models`].

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod http;
pub mod models;
pub mod patients;
pub mod search;
pub mod seed;
pub mod transport;
pub mod treatments;
pub mod uploads;

mod envelope;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use config::{ClientConfig, ConfigLayer};
pub use constants::*;
pub use error::{ClientError, ClientResult};
pub use http::HttpTransport;
pub use models::{
    Gender, ImageFormat, ImageSize, Media, MediaFormats, Patient, PatientInput, Treatment,
    TreatmentDetail, TreatmentDetailInput, TreatmentInput, TreatmentSummary, TreatmentTarget,
};
pub use patients::PatientService;
pub use search::PatientSearch;
pub use seed::{SeedPlan, SeedReport};
pub use transport::{ApiRequest, Method, Transport, Uploader};
pub use treatments::TreatmentService;
pub use uploads::UploadService;

pub use cms_query::{ListQuery, ListResponse, PageInfo};
pub use cms_types::{DocumentId, EntryId, IdError, NonEmptyText, TextError};
