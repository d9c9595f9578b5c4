use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// One entry of the embedded listing array, exactly as the site ships it.
///
/// Every key is optional; absence is the normal case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawListing(pub Map<String, Value>);

impl RawListing {
    /// Value stored under `key`, treating JSON `null` as absent.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Entries of the `images` array; a missing or non-array value yields none.
    pub fn images(&self) -> Vec<RawImage> {
        match self.field("images") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Value> for RawListing {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawListing(map),
            _ => RawListing::default(),
        }
    }
}

/// Image descriptor inside a raw listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    pub url: Option<String>,
    pub original_width: Option<Value>,
    pub original_height: Option<Value>,
}

/// Paging block describing where a result page sits in the full result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingMetadata {
    pub total_pages: u32,
    #[serde(default)]
    pub items_on_page: u32,
    #[serde(default)]
    pub total_matches: u32,
}

/// Normalized listing record handed back to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalListing {
    pub id: String,
    pub url: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub title: String,
    pub address: String,
    pub crawler: String,
    /// Net price when the site publishes one, otherwise `total_price`.
    pub price: Number,
    /// Gross price, `-1` when unknown.
    pub total_price: Number,
    pub size: String,
    pub rooms: String,
    #[serde(rename = "from")]
    pub available_from: String,
}
