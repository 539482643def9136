//! Backend data records (players and matches).
//!
//! These mirror the JSON objects the backend sends. Tool output is loosely
//! typed, so string fields tolerate `null` and numeric stats are optional.
//! Player records are read leniently: ids may arrive as numbers and stats as
//! numeric strings, and an unreadable stat becomes `None`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder shown for a stat the backend did not provide.
pub const MISSING_STAT: &str = "-";

/// A player entry from the live match context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub team: String,
    #[serde(
        default,
        deserialize_with = "lenient_stat",
        skip_serializing_if = "Option::is_none"
    )]
    pub runs: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_stat",
        skip_serializing_if = "Option::is_none"
    )]
    pub balls: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_stat",
        skip_serializing_if = "Option::is_none"
    )]
    pub strike_rate: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_stat",
        skip_serializing_if = "Option::is_none"
    )]
    pub wickets: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_stat",
        skip_serializing_if = "Option::is_none"
    )]
    pub economy: Option<f64>,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive substring match against the display name.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Formats an optional stat, falling back to [`MISSING_STAT`].
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => MISSING_STAT.to_string(),
    }
}

/// Which list a match belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Live,
    Upcoming,
    Recent,
    #[default]
    Scheduled,
}

/// A match summary from the match-list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team2: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: MatchKind,
}

/// Response of the match-list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchList {
    pub live: Vec<Match>,
    pub upcoming: Vec<Match>,
    pub recent: Vec<Match>,
}

impl MatchList {
    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.upcoming.is_empty() && self.recent.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strings as sent, numbers and booleans in their JSON text form, anything
/// else empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

/// Numbers and numeric strings; anything else is a missing stat.
fn lenient_stat<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}
