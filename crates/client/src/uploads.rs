//! Photo uploads.

use crate::models::{Media, TreatmentTarget};
use crate::transport::Uploader;
use crate::{ClientError, ClientResult};
use chrono::NaiveDate;
use cms_types::EntryId;
use std::path::Path;
use std::sync::Arc;

pub struct UploadService<U: ?Sized> {
    uploader: Arc<U>,
}

impl<U: Uploader + ?Sized> UploadService<U> {
    pub fn new(uploader: Arc<U>) -> Self {
        Self { uploader }
    }

    /// Uploads an in-memory blob. `name` becomes the stored file name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidInput`] for an empty blob and whatever the uploader raises.
    pub async fn upload_bytes(&self, blob: Vec<u8>, name: Option<String>) -> ClientResult<Media> {
        if blob.is_empty() {
            return Err(ClientError::InvalidInput("refusing to upload an empty file".into()));
        }
        let media = self.uploader.upload(blob, name).await?;
        tracing::info!("uploaded {} as media {}", media.name, media.id);
        Ok(media)
    }

    /// Reads `path` and uploads it under `name`, or under the file's own name when `name` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::FileRead`] if the file cannot be read.
    pub async fn upload_path(&self, path: &Path, name: Option<String>) -> ClientResult<Media> {
        let blob = tokio::fs::read(path).await.map_err(ClientError::FileRead)?;
        let name = name.or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });
        self.upload_bytes(blob, name).await
    }

    /// Deletes an uploaded file. Media are the one resource addressed by numeric id.
    pub async fn delete_file(&self, id: EntryId) -> ClientResult<()> {
        self.uploader.delete_file(id).await?;
        tracing::info!("deleted media {}", id);
        Ok(())
    }
}

/// Display name for a treatment photo: `<patient>_<YYYYMMDD>_<site label>_<NN>.<ext>`.
///
/// `index` is 1-based. Characters that are unsafe in file names are replaced with `_` in the
/// patient name; a blank name becomes `unknown`.
pub fn photo_name(
    patient: &str,
    date: NaiveDate,
    site: TreatmentTarget,
    index: usize,
    ext: &str,
) -> String {
    let mut patient: String = patient
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    if patient.is_empty() {
        patient.push_str("unknown");
    }

    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    let ext = if ext.is_empty() { "jpg".to_string() } else { ext };

    format!(
        "{patient}_{}_{}_{index:02}.{ext}",
        date.format("%Y%m%d"),
        site.label()
    )
}
