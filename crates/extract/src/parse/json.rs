use super::{Entry, Response, ResponseParser};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

/// Parser for `out=json` responses: `{"content": {..}}` on success,
/// `{"error": {"type": .., "message": ..}}` on failure. Other top-level keys
/// (`meta`, `warning`) are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

#[derive(Deserialize)]
struct Envelope {
    content: Option<Map<String, Value>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl ResponseParser for JsonParser {
    fn wants_json(&self) -> bool {
        true
    }

    #[instrument(level = "trace", skip(self, body), fields(body_size = body.len()))]
    fn parse(&self, body: &[u8]) -> Result<Response> {
        let envelope: Envelope = serde_json::from_slice(body).or_raise(|| ErrorKind::Parse)?;
        match envelope {
            Envelope { error: Some(error), .. } => Ok(Response::Error { kind: error.kind, message: error.message }),
            Envelope { content: Some(content), .. } => Ok(Response::Content(Entry::new(content))),
            Envelope { content: None, error: None } => exn::bail!(ErrorKind::Parse),
        }
    }
}
