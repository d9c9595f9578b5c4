use crate::error::ListingIncomplete;
use crate::models::{CanonicalListing, RawImage, RawListing};
use serde_json::{Number, Value};

pub const DEFAULT_TITLE: &str = "Flat title";
pub const NO_INFO: &str = "No info";
pub const UNKNOWN_PRICE: i64 = -1;

const RESIZE_MODE: &str = "1";
const QUALITY: &str = "1000";

/// Maps one raw listing onto the canonical record.
///
/// Fails only when `id` or `propertyUrl` is missing; every other field falls
/// back to its default.
pub fn normalize_listing(
    raw: &RawListing,
    crawler: &str,
    origin: &str,
) -> Result<CanonicalListing, ListingIncomplete> {
    let id = raw
        .field("id")
        .map(display)
        .filter(|id| !id.is_empty())
        .ok_or(ListingIncomplete { missing: "id" })?;
    let property_url = raw
        .field("propertyUrl")
        .map(display)
        .ok_or(ListingIncomplete {
            missing: "propertyUrl",
        })?;

    let images: Vec<String> = raw.images().iter().filter_map(image_url).collect();

    let street = text_or(raw, "street", "");
    let zip = text_or(raw, "zip", "");
    let city_name = text_or(raw, "cityName", "");

    let total_price = raw
        .field("price")
        .and_then(numeric)
        .unwrap_or_else(|| Number::from(UNKNOWN_PRICE));
    let price = raw
        .field("netPrice")
        .and_then(numeric)
        .unwrap_or_else(|| total_price.clone());

    Ok(CanonicalListing {
        id,
        url: format!("{}{}", origin, property_url),
        image: images.first().cloned(),
        images,
        title: text_or(raw, "title", DEFAULT_TITLE),
        address: format_address(&street, &zip, &city_name),
        crawler: crawler.to_string(),
        price,
        total_price,
        size: text_or(raw, "surfaceLiving", NO_INFO),
        rooms: text_or(raw, "numberOfRooms", NO_INFO),
        available_from: text_or(raw, "availableFromFormatted", NO_INFO),
    })
}

/// `"{street}, {zip} {city}"`, or `"{zip} {city}"` when the street is blank.
pub fn format_address(street: &str, zip: &str, city_name: &str) -> String {
    if street.is_empty() {
        format!("{} {}", zip, city_name)
    } else {
        format!("{}, {} {}", street, zip, city_name)
    }
}

/// Fills the image URL template with the image's own dimensions.
///
/// Placeholders without a value are left in place.
pub fn image_url(image: &RawImage) -> Option<String> {
    let mut url = image
        .url
        .as_deref()?
        .replace("{resizemode}", RESIZE_MODE)
        .replace("{quality}", QUALITY);

    if let Some(width) = &image.original_width {
        url = url.replace("{width}", &display(width));
    }
    if let Some(height) = &image.original_height {
        url = url.replace("{height}", &display(height));
    }

    Some(url)
}

fn text_or(raw: &RawListing, key: &str, default: &str) -> String {
    raw.field(key)
        .map(display)
        .unwrap_or_else(|| default.to_string())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        _ => None,
    }
}
