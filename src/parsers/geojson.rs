use serde_json::Value;
use tracing::{debug, warn};

use crate::core::error::ParseError;

/// True if the value has `type: "FeatureCollection"` and an array of `features`
pub fn is_feature_collection(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("FeatureCollection")
        && value.get("features").map_or(false, Value::is_array)
}

/// Parse GeoJSON bytes.
///
/// In strict mode anything but a FeatureCollection is a `ParseError`;
/// otherwise the mismatch is logged and the parsed JSON is returned as is.
pub fn parse(bytes: &[u8], strict: bool) -> Result<Value, ParseError> {
    let value: Value = serde_json::from_slice(bytes)?;

    if is_feature_collection(&value) {
        debug!("Valid GeoJSON FeatureCollection");
        return Ok(value);
    }

    if strict {
        return Err(ParseError::NotFeatureCollection);
    }

    let geojson_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("<missing>");
    warn!(
        geojson_type = %geojson_type,
        "GeoJSON is not a FeatureCollection, passing it through"
    );
    Ok(value)
}
