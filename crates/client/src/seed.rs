//! Bulk data generator for load testing a CMS instance.
//!
//! Each patient workflow creates one patient, then its treatment records. Every record carries
//! several lesions, and every lesion carries freshly uploaded photos of random bytes. Patient
//! workflows run concurrently up to [`SeedPlan::max_workers`]; the steps inside one workflow run
//! in order.

use crate::models::{Gender, PatientInput, TreatmentDetailInput, TreatmentInput, TreatmentTarget};
use crate::patients::PatientService;
use crate::transport::{Transport, Uploader};
use crate::treatments::TreatmentService;
use crate::uploads::{photo_name, UploadService};
use crate::{ClientError, ClientResult};
use chrono::{NaiveDate, Utc};
use cms_types::{DocumentId, NonEmptyText};
use futures::stream::{self, StreamExt};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::sync::Arc;

const SEED_NOTES: &str = "Generated by hcms seed";
const LESION_MINUTES: u32 = 30;
const RECORD_MINUTES: u32 = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedPlan {
    pub patients: usize,
    pub records_per_patient: usize,
    pub lesions_per_record: usize,
    pub photos_per_lesion: usize,
    /// Size of each generated photo.
    pub image_bytes: usize,
    /// Patient workflows in flight at once.
    pub max_workers: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            patients: 20,
            records_per_patient: 3,
            lesions_per_record: 2,
            photos_per_lesion: 2,
            image_bytes: 3 * 1024 * 1024,
            max_workers: 4,
        }
    }
}

impl SeedPlan {
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for zero workers or zero-byte photos.
    pub fn validate(&self) -> ClientResult<()> {
        if self.max_workers == 0 {
            return Err(ClientError::InvalidInput("max_workers must be at least 1".into()));
        }
        if self.lesions_per_record == 0 {
            return Err(ClientError::InvalidInput("lesions_per_record must be at least 1".into()));
        }
        if self.photos_per_lesion == 0 {
            return Err(ClientError::InvalidInput("photos_per_lesion must be at least 1".into()));
        }
        if self.image_bytes == 0 {
            return Err(ClientError::InvalidInput("image_bytes must be at least 1".into()));
        }
        Ok(())
    }

    pub fn expected_records(&self) -> usize {
        self.patients * self.records_per_patient
    }

    pub fn expected_photos(&self) -> usize {
        self.expected_records() * self.lesions_per_record * self.photos_per_lesion
    }
}

/// Outcome counts. `failures` counts failed patient creations, failed uploads, and records that
/// were skipped or rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub patients_created: usize,
    pub records_created: usize,
    pub photos_uploaded: usize,
    pub failures: usize,
}

impl SeedReport {
    fn absorb(&mut self, other: SeedReport) {
        self.patients_created += other.patients_created;
        self.records_created += other.records_created;
        self.photos_uploaded += other.photos_uploaded;
        self.failures += other.failures;
    }
}

struct Seeder<'a, T: ?Sized, U: ?Sized> {
    patients: PatientService<T>,
    treatments: TreatmentService<T>,
    uploads: UploadService<U>,
    plan: &'a SeedPlan,
    image: Vec<u8>,
    run: i64,
    today: NaiveDate,
}

/// Runs the seeding workload.
///
/// Individual failures are logged and counted, never fatal.
///
/// # Errors
///
/// Returns [`ClientError::InvalidInput`] if the plan is invalid.
pub async fn run_seed<T, U>(
    transport: Arc<T>,
    uploader: Arc<U>,
    plan: &SeedPlan,
) -> ClientResult<SeedReport>
where
    T: Transport + ?Sized,
    U: Uploader + ?Sized,
{
    plan.validate()?;
    tracing::info!(
        "seeding {} patients, {} records, {} photos of {} bytes",
        plan.patients,
        plan.expected_records(),
        plan.expected_photos(),
        plan.image_bytes
    );

    let mut image = vec![0u8; plan.image_bytes];
    rand::thread_rng().fill_bytes(&mut image);
    let now = Utc::now();

    let seeder = Seeder {
        patients: PatientService::new(transport.clone()),
        treatments: TreatmentService::new(transport),
        uploads: UploadService::new(uploader),
        plan,
        image,
        run: now.timestamp(),
        today: now.date_naive(),
    };

    let reports: Vec<SeedReport> = stream::iter(0..plan.patients)
        .map(|index| seeder.patient_workflow(index))
        .buffer_unordered(plan.max_workers)
        .collect()
        .await;

    let mut total = SeedReport::default();
    for report in reports {
        total.absorb(report);
    }
    tracing::info!(
        "seeding finished: {} patients, {} records, {} photos, {} failures",
        total.patients_created,
        total.records_created,
        total.photos_uploaded,
        total.failures
    );
    Ok(total)
}

impl<T, U> Seeder<'_, T, U>
where
    T: Transport + ?Sized,
    U: Uploader + ?Sized,
{
    async fn patient_workflow(&self, index: usize) -> SeedReport {
        let mut report = SeedReport::default();

        let created = match self.random_patient(index) {
            Ok(input) => self.patients.create(&input).await,
            Err(e) => Err(e),
        };
        let patient = match created {
            Ok(patient) => patient,
            Err(e) => {
                tracing::warn!("patient {}: creation failed: {}", index, e);
                report.failures += 1;
                return report;
            }
        };
        report.patients_created += 1;

        for record in 0..self.plan.records_per_patient {
            let submitted = self
                .seed_record(&patient.document_id, &patient.name, &mut report)
                .await;
            if submitted {
                report.records_created += 1;
            } else {
                report.failures += 1;
                tracing::warn!(
                    "patient {}: record {}/{} not created",
                    index,
                    record + 1,
                    self.plan.records_per_patient
                );
            }
        }
        report
    }

    fn random_patient(&self, index: usize) -> ClientResult<PatientInput> {
        let mut rng = rand::thread_rng();
        let gender = if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        };
        let name = NonEmptyText::new(format!("SeedUser_{}_{}", self.run, index))?;
        let mut input = PatientInput::new(name, gender);
        input.birthday = NaiveDate::from_ymd_opt(
            rng.gen_range(1940..=2010),
            rng.gen_range(1..=12),
            rng.gen_range(1..=28),
        );
        Ok(input)
    }

    /// Uploads the photos of each lesion and submits the record. Returns whether the record was
    /// created.
    async fn seed_record(
        &self,
        patient: &DocumentId,
        patient_name: &str,
        report: &mut SeedReport,
    ) -> bool {
        let (parts, sequence_number) = {
            let mut rng = rand::thread_rng();
            let parts: Vec<TreatmentTarget> = (0..self.plan.lesions_per_record)
                .map(|_| {
                    TreatmentTarget::ALL
                        .choose(&mut rng)
                        .copied()
                        .unwrap_or(TreatmentTarget::Maxillofacial)
                })
                .collect();
            (parts, rng.gen_range(1..=100u32))
        };

        let mut details = Vec::with_capacity(parts.len());
        for part in parts {
            let mut photos = Vec::with_capacity(self.plan.photos_per_lesion);
            for n in 1..=self.plan.photos_per_lesion {
                let name = photo_name(patient_name, self.today, part, n, "jpg");
                match self
                    .uploads
                    .upload_bytes(self.image.clone(), Some(name))
                    .await
                {
                    Ok(media) => {
                        report.photos_uploaded += 1;
                        photos.push(media.id);
                    }
                    Err(e) => {
                        report.failures += 1;
                        tracing::warn!("photo upload failed: {}", e);
                    }
                }
            }

            if photos.is_empty() {
                tracing::warn!("every upload for a {} lesion failed; skipping it", part);
                continue;
            }
            details.push(TreatmentDetailInput {
                part,
                notes: Some(SEED_NOTES.to_string()),
                duration: Some(LESION_MINUTES),
                photos,
            });
        }

        if details.is_empty() {
            return false;
        }

        let mut input = TreatmentInput::new(patient.clone());
        input.sequence_number = Some(sequence_number);
        input.duration = Some(RECORD_MINUTES);
        input.details = details;

        match self.treatments.create(&input).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("treatment submission failed: {}", e);
                false
            }
        }
    }
}
