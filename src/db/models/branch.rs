//! Branch entities embedded in a company account's `branches` array.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A physical location of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: String,
    pub name: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: String,
    pub sub_category: String,
    pub phone: String,
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Branch fields as they arrive in the multipart `data` part.
///
/// Every field is independently present or absent. Strings of the wrong JSON
/// type count as absent. Coordinates accept numbers or numeric strings; any
/// other present value (including an unparsable string) reads as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchPatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
}

impl BranchPatch {
    /// Parse the `data` part; anything but a JSON object is rejected
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(raw)? {
            value @ Value::Object(_) => serde_json::from_value(value),
            _ => Err(serde::de::Error::custom("branch data must be a JSON object")),
        }
    }

    /// Build a fresh branch; absent fields take their zero value
    pub fn into_branch(self, id: String, images: Vec<String>, now: DateTime<Utc>) -> Branch {
        Branch {
            id,
            name: self.name.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            latitude: self.latitude.unwrap_or_default(),
            longitude: self.longitude.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            sub_category: self.sub_category.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            images,
            rate: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlay onto an existing branch; absent fields keep their prior value
    pub fn apply_to(self, existing: &Branch, images: Vec<String>, now: DateTime<Utc>) -> Branch {
        Branch {
            id: existing.id.clone(),
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            location: self.location.unwrap_or_else(|| existing.location.clone()),
            latitude: self.latitude.unwrap_or(existing.latitude),
            longitude: self.longitude.unwrap_or(existing.longitude),
            category: self.category.unwrap_or_else(|| existing.category.clone()),
            sub_category: self
                .sub_category
                .unwrap_or_else(|| existing.sub_category.clone()),
            phone: self.phone.unwrap_or_else(|| existing.phone.clone()),
            description: self
                .description
                .unwrap_or_else(|| existing.description.clone()),
            images,
            rate: existing.rate,
            created_at: existing.created_at,
            updated_at: now,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or_default()),
        Value::String(s) => Some(s.parse::<f64>().unwrap_or_default()),
        _ => Some(0.0),
    })
}
