use crate::{ClientError, ClientResult};
use cms_types::{DocumentId, EntryId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One rendered size of an uploaded image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageFormat {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Size in kilobytes, as reported by the backend.
    #[serde(default)]
    pub size: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFormats {
    #[serde(default)]
    pub thumbnail: Option<ImageFormat>,
    #[serde(default)]
    pub small: Option<ImageFormat>,
    #[serde(default)]
    pub medium: Option<ImageFormat>,
    #[serde(default)]
    pub large: Option<ImageFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSize {
    Thumbnail,
    Small,
    Medium,
    Large,
    Original,
}

/// Media descriptor returned by the upload endpoint and embedded in treatment records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: EntryId,
    #[serde(rename = "documentId", default)]
    pub document_id: Option<DocumentId>,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub formats: Option<MediaFormats>,
}

impl Media {
    /// URL for the requested size, falling back to the next larger rendition and finally to the
    /// original.
    pub fn url_for(&self, size: ImageSize) -> &str {
        let Some(formats) = &self.formats else {
            return &self.url;
        };
        let ladder = [
            (ImageSize::Thumbnail, &formats.thumbnail),
            (ImageSize::Small, &formats.small),
            (ImageSize::Medium, &formats.medium),
            (ImageSize::Large, &formats.large),
        ];
        ladder
            .iter()
            .skip_while(|(s, _)| *s != size)
            .find_map(|(_, f)| Option::as_ref(*f))
            .map(|f| f.url.as_str())
            .unwrap_or(self.url.as_str())
    }

    /// Reads the descriptor out of an upload reply.
    ///
    /// The endpoint answers with an array of descriptors, which an intermediary may have wrapped
    /// as `{ data: [...] }`. The first element is the uploaded file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UploadFailed`] when no descriptor can be read.
    pub fn from_upload_response(reply: Value) -> ClientResult<Self> {
        let list = match reply {
            Value::Array(list) => list,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(list)) => list,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let first = list
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::UploadFailed("reply contains no file".into()))?;
        serde_json::from_value(first)
            .map_err(|e| ClientError::UploadFailed(format!("unreadable media descriptor: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uploaded() -> Value {
        json!({
            "id": 31,
            "documentId": "m2r8q1k0",
            "name": "zhangsan_20251230_chest_01.jpg",
            "url": "/uploads/zhangsan_abc.jpg",
            "width": 1920,
            "height": 1080,
            "size": 512.4,
            "mime": "image/jpeg",
            "formats": {
                "thumbnail": { "url": "/uploads/thumbnail_abc.jpg", "width": 245, "height": 138 },
                "medium": { "url": "/uploads/medium_abc.jpg", "width": 750, "height": 422 }
            }
        })
    }

    #[test]
    fn reads_first_descriptor_from_bare_or_wrapped_array() {
        let bare = Media::from_upload_response(json!([uploaded()])).unwrap();
        let wrapped = Media::from_upload_response(json!({ "data": [uploaded()] })).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.id, EntryId(31));
        assert_eq!(bare.width, Some(1920));
    }

    #[test]
    fn unparseable_upload_reply_is_an_error() {
        for reply in [json!([]), json!({}), json!(null), json!([{ "id": "x" }])] {
            let err = Media::from_upload_response(reply).unwrap_err();
            assert!(matches!(err, ClientError::UploadFailed(_)));
        }
    }

    #[test]
    fn url_for_falls_back_to_larger_sizes() {
        let media: Media = serde_json::from_value(uploaded()).unwrap();
        assert_eq!(media.url_for(ImageSize::Thumbnail), "/uploads/thumbnail_abc.jpg");
        assert_eq!(media.url_for(ImageSize::Small), "/uploads/medium_abc.jpg");
        assert_eq!(media.url_for(ImageSize::Large), "/uploads/zhangsan_abc.jpg");
        assert_eq!(media.url_for(ImageSize::Original), "/uploads/zhangsan_abc.jpg");
    }
}
