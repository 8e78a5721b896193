// Serde helpers for model fields that may come from the API in multiple formats.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes a field that the API may send as `null`, falling back to `T::default()`.
pub fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a float from either a JSON number, a numeric string ("12.5") or `null` (0.0).
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_f64(deserializer)?.unwrap_or_default())
}

/// Like [`deserialize_lenient_f64`] but keeps `null`, unparseable strings and
/// non-finite values ("NaN", "inf") as `None`.
pub fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberFormat {
        Number(f64),
        String(String),
    }

    let value = Option::<NumberFormat>::deserialize(deserializer)?;
    let parsed = match value {
        None => None,
        Some(NumberFormat::Number(n)) => Some(n),
        Some(NumberFormat::String(s)) => s.trim().parse::<f64>().ok(),
    };
    Ok(parsed.filter(|n| n.is_finite()))
}

/// Deserializes a GeoJSON position into `[longitude, latitude]`.
///
/// Extra elements (altitude) are ignored, `null` or non-numeric elements read
/// as 0.0, and anything that is not an array of at least two elements falls
/// back to `[0.0, 0.0]`.
pub fn deserialize_coordinates<'de, D>(deserializer: D) -> Result<[f64; 2], D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok([0.0, 0.0]);
    };
    if items.len() < 2 {
        return Ok([0.0, 0.0]);
    }
    Ok([coordinate(&items[0]), coordinate(&items[1])])
}

fn coordinate(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or_default()
}

/// Deserializes a boolean-ish flag.
///
/// The API mixes `"Yes"`/`"No"`, `"True"`/`"False"`, `0`/`1` and real booleans
/// for the same concept depending on the endpoint. Anything unrecognised is `None`.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagFormat {
        Bool(bool),
        Number(f64),
        String(String),
    }

    let value = Option::<FlagFormat>::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(FlagFormat::Bool(b)) => Some(b),
        Some(FlagFormat::Number(n)) => Some(n != 0.0),
        Some(FlagFormat::String(s)) => parse_flag(&s),
    })
}

/// Parses the textual flag spellings used by the device firmware.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "on" => Some(true),
        "no" | "false" | "0" | "off" => Some(false),
        _ => None,
    }
}
