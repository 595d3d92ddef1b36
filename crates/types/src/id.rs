//! Entity identifiers.
//!
//! The CMS hands out two identifiers per entity:
//!
//! - a **document identifier** (`documentId`): an opaque string that stays stable across
//!   entity versions and drafts. Every update and delete is addressed by it.
//! - an **entry identifier** (`id`): a numeric surrogate for one stored row. It changes when a
//!   new version of the entity is written and must never be used to address a mutation.
//!
//! The two are separate types so that one cannot be passed where the other is expected. A
//! numeric string handed to [`DocumentId::parse`] is rejected rather than coerced.

use std::{fmt, str::FromStr};

/// Error type for identifier validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty or whitespace only
    #[error("document id cannot be empty")]
    Empty,

    /// The identifier is a numeric surrogate, not a document id
    #[error("'{0}' is a numeric entry id; mutations must be addressed by document id")]
    NumericSurrogate(String),

    /// The identifier contains characters that cannot appear in a resource path
    #[error("document id contains invalid characters: '{0}'")]
    InvalidCharacters(String),
}

/// Stable opaque string identifier of a CMS entity.
///
/// Once constructed the value is guaranteed to be non-empty, not purely numeric, and safe to
/// embed as a single path segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    /// Validates an externally supplied document identifier.
    ///
    /// # Errors
    ///
    /// - [`IdError::Empty`] for blank input,
    /// - [`IdError::NumericSurrogate`] when the input consists of ASCII digits only,
    /// - [`IdError::InvalidCharacters`] for whitespace or URL delimiters.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::NumericSurrogate(trimmed.to_owned()));
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '&' | '%'))
        {
            return Err(IdError::InvalidCharacters(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for DocumentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DocumentId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Numeric surrogate key of a stored entry.
///
/// Only meaningful for linking uploaded media into records and for deleting uploaded files.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_opaque_document_id() {
        let id = DocumentId::parse("h1ak2b8x9q0z7c3d4e5f6g7h").expect("valid id");
        assert_eq!(id.as_str(), "h1ak2b8x9q0z7c3d4e5f6g7h");
        assert_eq!(id.to_string(), "h1ak2b8x9q0z7c3d4e5f6g7h");
    }

    #[test]
    fn numeric_input_is_not_coerced_into_document_id() {
        let err = DocumentId::parse("42").expect_err("numeric ids are surrogates");
        assert_eq!(err, IdError::NumericSurrogate("42".into()));
    }

    #[test]
    fn rejects_path_delimiters() {
        assert!(matches!(
            DocumentId::parse("abc/../def"),
            Err(IdError::InvalidCharacters(_))
        ));
        assert!(matches!(
            DocumentId::parse("abc def"),
            Err(IdError::InvalidCharacters(_))
        ));
        assert_eq!(DocumentId::parse(" \t"), Err(IdError::Empty));
    }

    #[test]
    fn deserialize_validates_document_id() {
        let ok: DocumentId = serde_json::from_str("\"xk29sl\"").expect("string id");
        assert_eq!(ok.as_str(), "xk29sl");

        assert!(serde_json::from_str::<DocumentId>("\"123\"").is_err());
        assert!(serde_json::from_str::<DocumentId>("123").is_err());
    }

    #[test]
    fn entry_id_is_transparent_number() {
        let id: EntryId = serde_json::from_str("17").expect("numeric id");
        assert_eq!(id, EntryId(17));
        assert_eq!(serde_json::to_string(&id).unwrap(), "17");
        assert_eq!("  9 ".parse::<EntryId>().unwrap(), EntryId(9));
    }
}
