use chrono::{DateTime, TimeZone, Utc};
use json::JsonValue;
use thiserror::Error;

pub mod champion;
pub mod item;
pub mod league;
pub mod livegame;
pub mod mastery;
pub mod matches;
pub mod summoner;
pub mod versions;

#[derive(Debug, Error)]
pub enum ParsingError {
    #[error("Invalid type for field: {0}")]
    InvalidType(String),
    #[error("Response body is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Response body is not valid JSON: {0}")]
    InvalidJson(#[from] json::Error),
}

/// Decodes a raw response body.
pub fn parse_body(body: &[u8]) -> Result<JsonValue, ParsingError> {
    let text = std::str::from_utf8(body)?;
    Ok(json::parse(text)?)
}

fn timestamp_millis(value: &JsonValue, field: &str) -> Result<DateTime<Utc>, ParsingError> {
    value
        .as_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or(ParsingError::InvalidType(field.into()))
}

fn str_field(value: &JsonValue, field: &str) -> Result<String, ParsingError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(ParsingError::InvalidType(field.into()))
}
