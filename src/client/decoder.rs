//! Response decoding.
//!
//! Bodies decode structurally through serde: unknown fields are ignored,
//! missing `Option` fields become `None`, and enums match variant names
//! exactly.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{Error, Result};

/// Decode a response body into `T`.
///
/// An empty body (as sent with 204) decodes as JSON `null`, so `()` and
/// `Option<T>` targets succeed on it.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    let json = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(json).map_err(|e| Error::malformed::<T>(body, e))
}

/// Decode one page of a list endpoint.
pub fn decode_page<T: DeserializeOwned>(body: &str) -> Result<PageEnvelope<T>> {
    decode::<PageEnvelope<T>>(body)
}

/// One page of a list response.
///
/// ```json
/// { "results": [ ... ], "paging": { "nextPage": "/v1/users?offset=10" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PageEnvelope<T> {
    /// The items in this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Paging metadata; absent on the last page.
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl<T> PageEnvelope<T> {
    /// Reference to the next page, if there is one.
    pub fn next_link(&self) -> Option<&str> {
        self.paging.as_ref().and_then(Paging::next_link)
    }
}

/// Paging metadata from a list response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// Absolute or base-relative link to the next page.
    #[serde(default)]
    pub next_page: Option<String>,
    /// Page size, when reported.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Offset of this page, when reported.
    #[serde(default)]
    pub offset: Option<u64>,
    /// Total item count, when reported.
    #[serde(default)]
    pub total: Option<u64>,
}

impl Paging {
    /// The next-page reference, unless absent or empty.
    pub fn next_link(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|link| !link.is_empty())
    }

    /// Returns `true` if another page exists.
    pub fn has_more(&self) -> bool {
        self.next_link().is_some()
    }
}

/// Serde helpers for the platform's timestamp text.
///
/// Accepts RFC 3339 (`2024-03-01T10:00:00Z`) as well as the colon-less
/// offset form the platform emits (`2024-03-01T10:00:00.000+0000`).
///
/// ```
/// use chrono::{DateTime, Utc};
///
/// #[derive(serde::Deserialize)]
/// struct Enrollment {
///     #[serde(with = "learnhub_rs::client::timestamp")]
///     created: DateTime<Utc>,
///     #[serde(default, with = "learnhub_rs::client::timestamp::option")]
///     completed: Option<DateTime<Utc>>,
/// }
///
/// let e: Enrollment =
///     serde_json::from_str(r#"{"created":"2024-03-01T10:00:00.000+0000"}"#).unwrap();
/// assert!(e.completed.is_none());
/// ```
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const COMPACT_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

    /// Parse a platform timestamp.
    pub fn parse(text: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .or_else(|_| DateTime::parse_from_str(text, COMPACT_OFFSET))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Deserialize a required timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {text}")))
    }

    /// Serialize as RFC 3339.
    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    /// Same helpers for nullable timestamps.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        /// Deserialize an optional timestamp; `null` becomes `None`.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(text) => super::parse(&text).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp: {text}"))
                }),
            }
        }

        /// Serialize as RFC 3339 or `null`.
        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }
    }
}
