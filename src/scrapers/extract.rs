//! Pulls JSON fragments out of the hydration-state script embedded in a
//! result page.
//!
//! The state object is large and its schema is not ours, so it is never
//! parsed whole. Two regions are cut out of its text by key-name landmarks
//! instead, always taking the shortest run between them.

use crate::error::ExtractionError;
use crate::scrapers::types::Landmarks;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::de::DeserializeOwned;

/// Returns the text of the first `<script>` node that contains `marker`.
pub fn locate_state_script(html: &Html, marker: &str) -> Result<String, ExtractionError> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "script")
        .map(|element| element.text().collect::<String>())
        .find(|text| text.contains(marker))
        .ok_or_else(|| ExtractionError::MissingStateBlock {
            marker: marker.to_string(),
        })
}

/// Cuts the JSON value found between `left:` and `,right` out of raw text.
#[derive(Debug, Clone)]
pub struct SliceExtractor {
    left: String,
    pattern: Regex,
}

impl SliceExtractor {
    pub fn new(landmarks: &Landmarks) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            "{}:(.*?),{}",
            regex::escape(&landmarks.left),
            regex::escape(&landmarks.right)
        ))?;

        Ok(Self {
            left: landmarks.left.clone(),
            pattern,
        })
    }

    /// Raw text of the first, shortest slice between the landmarks.
    pub fn slice<'t>(&self, text: &'t str) -> Result<&'t str, ExtractionError> {
        self.pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ExtractionError::MalformedSlice {
                landmark: self.left.clone(),
                reason: "landmarks not found".to_string(),
            })
    }

    /// Slices and deserializes in one step.
    pub fn extract<T: DeserializeOwned>(&self, text: &str) -> Result<T, ExtractionError> {
        let fragment = self.slice(text)?;
        serde_json::from_str(fragment).map_err(|e| ExtractionError::MalformedSlice {
            landmark: self.left.clone(),
            reason: e.to_string(),
        })
    }
}
