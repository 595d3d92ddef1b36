//! Treatment records.

use crate::constants::TREATMENTS_PATH;
use crate::envelope::{data_envelope, decode_entity};
use crate::models::{Treatment, TreatmentInput};
use crate::transport::{ApiRequest, Transport};
use crate::ClientResult;
use cms_query::{
    Filters, ListQuery, ListResponse, Operator, Populate, QueryBuilder, QueryDefaults, Relation,
    Sort,
};
use cms_types::DocumentId;
use std::sync::Arc;

/// List defaults: newest first, with the owning patient, the record's images, and each lesion's
/// photos.
pub fn treatment_defaults() -> QueryDefaults {
    QueryDefaults {
        sort: vec![Sort::desc("createdAt")],
        populate: Populate::relations(["patient", "Images"])
            .with(Relation::new("details").populate(Relation::new("photos"))),
    }
}

pub struct TreatmentService<T: ?Sized> {
    transport: Arc<T>,
    builder: QueryBuilder,
}

impl<T: Transport + ?Sized> TreatmentService<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            builder: QueryBuilder::new(treatment_defaults()),
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub async fn list(&self, query: &ListQuery) -> ClientResult<ListResponse<Treatment>> {
        let qs = self.builder.to_query_string(query);
        tracing::debug!("listing treatments: {}", qs);
        let reply = self
            .transport
            .send(ApiRequest::get(TREATMENTS_PATH, Some(qs)))
            .await?;
        Ok(ListResponse::from_envelope(&reply))
    }

    /// Lists the treatments of one patient. Other criteria in `query` still apply.
    pub async fn list_for_patient(
        &self,
        patient: &DocumentId,
        query: ListQuery,
    ) -> ClientResult<ListResponse<Treatment>> {
        let query = query.filters(Filters::new().with(
            "patient.documentId",
            Operator::Eq,
            patient.as_str(),
        ));
        self.list(&query).await
    }

    pub async fn create(&self, input: &TreatmentInput) -> ClientResult<Treatment> {
        let reply = self
            .transport
            .send(ApiRequest::post(TREATMENTS_PATH, data_envelope(input)?))
            .await?;
        let treatment: Treatment = decode_entity(reply)?;
        tracing::info!(
            "created treatment {} for patient {}",
            treatment.document_id,
            input.patient
        );
        Ok(treatment)
    }

    pub async fn update(&self, id: &DocumentId, input: &TreatmentInput) -> ClientResult<Treatment> {
        let reply = self
            .transport
            .send(ApiRequest::put(
                format!("{TREATMENTS_PATH}/{id}"),
                data_envelope(input)?,
            ))
            .await?;
        decode_entity(reply)
    }

    pub async fn delete(&self, id: &DocumentId) -> ClientResult<()> {
        self.transport
            .send(ApiRequest::delete(format!("{TREATMENTS_PATH}/{id}")))
            .await?;
        tracing::info!("deleted treatment {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TreatmentDetailInput, TreatmentTarget};
    use crate::testing::FakeTransport;
    use crate::transport::Method;
    use cms_types::EntryId;
    use serde_json::json;

    #[tokio::test]
    async fn list_expands_patient_images_and_lesion_photos() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Ok(json!({ "data": { "data": [], "meta": { "pagination": { "total": 0 } } } }))
        }));
        let service = TreatmentService::new(transport.clone());
        service
            .list(&ListQuery::new().paginate(3, 20).unwrap())
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0].query.as_deref(),
            Some(
                "pagination[page]=3&pagination[pageSize]=20&sort[0]=createdAt%3Adesc\
                 &populate[patient]=true&populate[Images]=true\
                 &populate[details][populate][0]=photos"
            )
        );
    }

    #[tokio::test]
    async fn list_for_patient_filters_by_relation_document_id() {
        let transport = Arc::new(FakeTransport::new(|_| {
            Ok(json!({
                "data": [
                    { "documentId": "tr1a", "target": "Chest",
                      "patient": { "documentId": "pa1x", "Name": "张三" } },
                    { "documentId": 5 }
                ],
                "meta": { "pagination": { "total": 2 } }
            }))
        }));
        let service = TreatmentService::new(transport.clone());
        let page = service
            .list_for_patient(&DocumentId::parse("pa1x").unwrap(), ListQuery::new())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1, "undecodable item is skipped");
        assert_eq!(page.total(), 2);
        let query = transport.requests()[0].query.clone().unwrap();
        assert!(query.contains("filters[patient][documentId][$eq]=pa1x"), "{query}");
    }

    #[tokio::test]
    async fn create_sends_lesions_with_photo_ids() {
        let transport = Arc::new(FakeTransport::new(|req| {
            let body = req.body.clone().unwrap_or_default();
            assert_eq!(body["data"]["patient"], json!("pa1x"));
            assert_eq!(body["data"]["details"][0]["photos"], json!([3, 4]));
            Ok(json!({ "data": { "documentId": "tr7q", "target": "Limbs" } }))
        }));
        let service = TreatmentService::new(transport);

        let mut input = TreatmentInput::new(DocumentId::parse("pa1x").unwrap());
        input.target = Some(TreatmentTarget::Limbs);
        input.details.push(TreatmentDetailInput {
            part: TreatmentTarget::Limbs,
            notes: None,
            duration: Some(20),
            photos: vec![EntryId(3), EntryId(4)],
        });

        let created = service.create(&input).await.unwrap();
        assert_eq!(created.document_id.as_str(), "tr7q");
        assert_eq!(created.target, Some(TreatmentTarget::Limbs));
    }

    #[tokio::test]
    async fn update_and_delete_use_document_id_paths() {
        let transport = Arc::new(FakeTransport::new(|req| match req.method {
            Method::Put => Ok(json!({ "data": { "documentId": "tr7q" } })),
            _ => Ok(serde_json::Value::Null),
        }));
        let service = TreatmentService::new(transport.clone());
        let id = DocumentId::parse("tr7q").unwrap();

        service
            .update(&id, &TreatmentInput::new(DocumentId::parse("pa1x").unwrap()))
            .await
            .unwrap();
        service.delete(&id).await.unwrap();

        let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, ["treatments/tr7q", "treatments/tr7q"]);
    }
}
