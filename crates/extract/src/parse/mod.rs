//! Turning raw API response bodies into [`Response`] values.

mod json;

pub use self::json::JsonParser;

use crate::error::Result;
use serde_json::{Map, Value};

/// A decoded API response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The API returned an entry.
    Content(Entry),
    /// The API reported an error instead of an entry.
    Error { kind: String, message: String },
}

/// The fields of one entry, as sent by the API.
///
/// Values are kept loosely typed; interpreting them (and rejecting bad ones)
/// is [`populate`](crate::populate)'s job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    fields: Map<String, Value>,
}
impl Entry {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }
}
impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Decodes a response body in one particular wire format.
pub trait ResponseParser: Send + Sync {
    /// Whether the API should be asked for this parser's format with
    /// `out=json`.
    fn wants_json(&self) -> bool;

    fn parse(&self, body: &[u8]) -> Result<Response>;
}
