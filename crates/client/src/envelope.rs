//! `{ data: ... }` wrapping for write payloads and single-entity replies.

use crate::{ClientError, ClientResult};
use cms_query::unwrap_entity;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

/// Serializes `input` as the `data` member of a write payload.
pub(crate) fn data_envelope<T: Serialize + ?Sized>(input: &T) -> ClientResult<Value> {
    let data = serde_json::to_value(input).map_err(ClientError::Serialization)?;
    Ok(json!({ "data": data }))
}

/// Decodes the entity carried by a create or update reply.
///
/// # Errors
///
/// Returns [`ClientError::InvalidResponse`] if the reply has no entity object or the entity does
/// not match `T`. The message names the offending field path.
pub(crate) fn decode_entity<T: DeserializeOwned>(reply: Value) -> ClientResult<T> {
    let entity = unwrap_entity(&reply)
        .cloned()
        .ok_or_else(|| ClientError::InvalidResponse("reply carries no entity".into()))?;

    serde_path_to_error::deserialize(entity).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() {
            "<root>".to_string()
        } else {
            path
        };
        ClientError::InvalidResponse(format!("{path}: {}", err.into_inner()))
    })
}
