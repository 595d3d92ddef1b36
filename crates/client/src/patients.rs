//! Patient records.

use crate::constants::PATIENTS_PATH;
use crate::envelope::{data_envelope, decode_entity};
use crate::models::{Patient, PatientInput};
use crate::search::PatientSearch;
use crate::transport::{ApiRequest, Transport};
use crate::ClientResult;
use cms_query::{ListQuery, ListResponse, Populate, QueryBuilder, QueryDefaults, Relation, Sort};
use cms_types::DocumentId;
use std::sync::Arc;

/// List defaults: most recently updated first, with a summary of each patient's treatments.
pub fn patient_defaults() -> QueryDefaults {
    QueryDefaults {
        sort: vec![Sort::desc("updatedAt")],
        populate: Populate::new().with(
            Relation::new("treatments")
                .fields(["treatmentNo", "target", "createdAt", "documentId"])
                .sort(Sort::desc("createdAt")),
        ),
    }
}

pub struct PatientService<T: ?Sized> {
    transport: Arc<T>,
    builder: QueryBuilder,
}

impl<T: Transport + ?Sized> PatientService<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            builder: QueryBuilder::new(patient_defaults()),
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Lists one page of patients. A malformed reply reads as an empty page.
    pub async fn list(&self, query: &ListQuery) -> ClientResult<ListResponse<Patient>> {
        let qs = self.builder.to_query_string(query);
        tracing::debug!("listing patients: {}", qs);
        let reply = self
            .transport
            .send(ApiRequest::get(PATIENTS_PATH, Some(qs)))
            .await?;
        Ok(ListResponse::from_envelope(&reply))
    }

    /// Lists the page selected by the search form.
    pub async fn search(&self, search: &PatientSearch) -> ClientResult<ListResponse<Patient>> {
        self.list(&search.to_query()?).await
    }

    pub async fn create(&self, input: &PatientInput) -> ClientResult<Patient> {
        let reply = self
            .transport
            .send(ApiRequest::post(PATIENTS_PATH, data_envelope(input)?))
            .await?;
        let patient: Patient = decode_entity(reply)?;
        tracing::info!("created patient {}", patient.document_id);
        Ok(patient)
    }

    pub async fn update(&self, id: &DocumentId, input: &PatientInput) -> ClientResult<Patient> {
        let reply = self
            .transport
            .send(ApiRequest::put(
                format!("{PATIENTS_PATH}/{id}"),
                data_envelope(input)?,
            ))
            .await?;
        decode_entity(reply)
    }

    pub async fn delete(&self, id: &DocumentId) -> ClientResult<()> {
        self.transport
            .send(ApiRequest::delete(format!("{PATIENTS_PATH}/{id}")))
            .await?;
        tracing::info!("deleted patient {}", id);
        Ok(())
    }
}
