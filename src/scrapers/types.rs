/// Default origin every listing URL is prefixed with
pub const IMMOSCOUT_ORIGIN: &str = "https://www.immoscout24.ch";

/// Default page cap for one crawl call
pub const RESULT_LIMIT: u32 = 50;

/// A pair of JSON key names that bracket one region of the state blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Landmarks {
    pub left: String,
    pub right: String,
}

impl Landmarks {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Site constants for the ImmoScout24 crawler
#[derive(Debug, Clone)]
pub struct ImmoscoutSettings {
    /// Origin listing URLs are built from and search URLs must start with
    pub origin: String,
    /// Page cap used when the caller passes none
    pub result_limit: u32,
    /// Text that identifies the hydration-state script node
    pub state_marker: String,
    /// Landmarks around the listing array
    pub listings: Landmarks,
    /// Landmarks around the paging object
    pub paging: Landmarks,
}

impl ImmoscoutSettings {
    /// Same site constants, but served from another origin.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

impl Default for ImmoscoutSettings {
    fn default() -> Self {
        Self {
            origin: IMMOSCOUT_ORIGIN.to_string(),
            result_limit: RESULT_LIMIT,
            state_marker: "__INITIAL_STATE__".to_string(),
            listings: Landmarks::new(r#""listData""#, r#""pagingData""#),
            paging: Landmarks::new(r#""pagingData""#, r#""viewData""#),
        }
    }
}
