//! Records persisted in the flat-file collections and the payloads that create them
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

pub const DONATIONS: &str = "donations";
pub const MEDIA: &str = "media";

/// A single donation, stored in receipt order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub name: String,
    pub amount: Amount,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
}

/// Amount exactly as the donor sent it. Numbers stay numbers, strings stay strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

/// Metadata for an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub filename: String,
    pub original_name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(with = "iso_millis")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Anything that is not an image is filed as video.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image") {
            MediaType::Image
        } else {
            MediaType::Video
        }
    }
}

/// Body of `POST /donate` before validation.
#[derive(Debug, Default, Deserialize)]
pub struct DonatePayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
}

/// A donation that passed presence checks and is ready to be stamped and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonation {
    pub name: String,
    pub amount: Amount,
}

impl NewDonation {
    pub fn received_at(self, date: DateTime<Utc>) -> Donation {
        Donation {
            name: self.name,
            amount: self.amount,
            date,
        }
    }
}

impl TryFrom<DonatePayload> for NewDonation {
    type Error = ApiError;

    fn try_from(payload: DonatePayload) -> Result<Self, Self::Error> {
        let name = match payload.name {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        };

        // Zero and empty strings count as missing, same as any other blank value.
        let amount = match payload.amount {
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(Amount::Number(n)),
            Some(Value::String(s)) if !s.is_empty() => Some(Amount::Text(s)),
            _ => None,
        };

        match (name, amount) {
            (Some(name), Some(amount)) => Ok(NewDonation { name, amount }),
            _ => Err(ApiError::validation_error("Name and amount are required.")),
        }
    }
}

/// Body of `POST /admin/login`. Fields of the wrong type fail the credential
/// check instead of the JSON parse.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<Value>,
    #[serde(default)]
    pub password: Option<Value>,
}

impl LoginRequest {
    /// Username and password as text; anything but a string becomes empty.
    pub fn credentials(self) -> (String, String) {
        (as_text(self.username), as_text(self.password))
    }
}

fn as_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
