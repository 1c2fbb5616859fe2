//! The archive's record model and the path from raw API bytes to it.
//!
//! ```text
//! body ──ResponseParser──▶ Response ──populate──▶ ArchiveRecord
//! ```
//!
//! Parsing only checks the payload's shape. Everything about the *content*
//! (required fields, numbers that arrive as strings, dates, reviews) is
//! checked by [`populate`], so the two failure modes stay distinguishable.

pub mod error;
pub mod models;
mod parse;
mod populate;

pub use crate::models::{ArchiveRecord, PathResolver, Review};
pub use crate::parse::{Entry, JsonParser, Response, ResponseParser};
pub use crate::populate::populate;
