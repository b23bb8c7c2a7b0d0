//! Reduces provider payloads to a flat, ordered list of song titles.
//!
//! The remote recommender answers with a bare JSON array while the local
//! script wraps its result as `{"recommendations": [...]}`. Both shapes are
//! accepted; anything else is malformed and yields no recommendations.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::SongTitle;
use crate::util::preview;

/// Payload does not match any accepted shape
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unexpected payload shape: {0}")]
pub struct MalformedPayload(pub String);

/// The accepted recommendation payload shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationPayload {
    /// `["A", "B"]`
    Plain(Vec<SongTitle>),
    /// `{"recommendations": ["A", "B"]}`
    Keyed(Vec<SongTitle>),
}

impl RecommendationPayload {
    pub fn into_songs(self) -> Vec<SongTitle> {
        match self {
            RecommendationPayload::Plain(songs) | RecommendationPayload::Keyed(songs) => songs,
        }
    }
}

/// Resolve a recommend payload: a list wins, then a keyed `recommendations` list.
pub fn parse_payload(payload: &Value) -> Result<RecommendationPayload, MalformedPayload> {
    if let Value::Array(items) = payload {
        return string_list(items)
            .map(RecommendationPayload::Plain)
            .ok_or_else(|| malformed(payload));
    }

    if let Some(Value::Array(items)) = payload.get("recommendations") {
        return string_list(items)
            .map(RecommendationPayload::Keyed)
            .ok_or_else(|| malformed(payload));
    }

    Err(malformed(payload))
}

/// Normalize a recommend payload, treating malformed input as "no recommendations".
pub fn normalize(payload: &Value) -> Vec<SongTitle> {
    match parse_payload(payload) {
        Ok(parsed) => parsed.into_songs(),
        Err(e) => {
            warn!("Discarding recommendation response: {e}");
            Vec::new()
        }
    }
}

/// Search results are only ever a plain list of titles.
pub fn parse_suggestions(payload: &Value) -> Result<Vec<SongTitle>, MalformedPayload> {
    match payload {
        Value::Array(items) => string_list(items).ok_or_else(|| malformed(payload)),
        _ => Err(malformed(payload)),
    }
}

fn string_list(items: &[Value]) -> Option<Vec<SongTitle>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn malformed(payload: &Value) -> MalformedPayload {
    MalformedPayload(preview(&payload.to_string(), 200))
}
