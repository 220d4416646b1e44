use serde::{Deserialize, Deserializer, Serialize};

/// A named grouping of catalog items, as returned by `GET /category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// A single catalog entry (a flower).
///
/// Only `name` is required. The mock API is loose about types, so every
/// other field tolerates whatever shape it arrives in: numbers accept numeric
/// strings, text accepts numbers and booleans, and anything unusable falls
/// back to the field's empty value instead of rejecting the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_top_of_the_week: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bonus: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub origin: String,
}

/// Any JSON value, with the scalar cases kept.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
    Other(serde::de::IgnoredAny),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Number(n) => n.as_f64().unwrap_or(0.0),
        Scalar::String(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            tracing::debug!(value = %s, "Non-numeric value in numeric field, using 0");
            0.0
        }),
        Scalar::Bool(_) | Scalar::Null | Scalar::Other(_) => 0.0,
    })
}

// `bonus` shows up as text, numbers, or booleans depending on who edited the mock
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::String(s) => s,
        Scalar::Number(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Null | Scalar::Other(_) => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Bool(b) => b,
        Scalar::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Scalar::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Scalar::Null | Scalar::Other(_) => false,
    })
}
