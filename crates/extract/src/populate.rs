//! Normalizing a decoded [`Entry`] into an [`ArchiveRecord`].

use crate::error::{ErrorKind, Result};
use crate::models::{ArchiveRecord, Review};
use crate::parse::{Entry, Response};
use exn::{OptionExt, ResultExt};
use serde_json::Value;
use std::str::FromStr;
use time::Date;
use time::macros::format_description;
use tracing::instrument;

/// Build the record for `requested_id` from a decoded response.
///
/// An API-reported error, a missing `id`/`dir`/`filename`, an `id` that is
/// not the one requested, or any field that cannot be interpreted is a
/// populate error.
#[instrument(level = "debug", skip(response))]
pub fn populate(response: Response, requested_id: u64) -> Result<ArchiveRecord> {
    let entry = match response {
        Response::Content(entry) => entry,
        Response::Error { kind, message } => exn::bail!(ErrorKind::Populate(format!("{kind}: {message}"))),
    };
    let id: u64 = number(&entry, "id")?.ok_or_raise(|| ErrorKind::MissingField("id"))?;
    if id != requested_id {
        exn::bail!(ErrorKind::InvalidField { field: "id", value: format!("{id} (requested {requested_id})") });
    }
    let dir = text(&entry, "dir").filter(|s| !s.is_empty()).ok_or_raise(|| ErrorKind::MissingField("dir"))?;
    let filename =
        text(&entry, "filename").filter(|s| !s.is_empty()).ok_or_raise(|| ErrorKind::MissingField("filename"))?;
    let reviews = reviews(&entry)?;
    Ok(ArchiveRecord {
        id,
        title: text(&entry, "title").unwrap_or_default(),
        dir,
        filename,
        size: number(&entry, "size")?.unwrap_or_default(),
        age: number(&entry, "age")?.unwrap_or_default(),
        date: date(&entry, "date")?,
        author: text(&entry, "author").unwrap_or_default(),
        email: text(&entry, "email").unwrap_or_default(),
        description: text(&entry, "description").unwrap_or_default(),
        credits: text(&entry, "credits").unwrap_or_default(),
        base: text(&entry, "base").unwrap_or_default(),
        buildtime: text(&entry, "buildtime").unwrap_or_default(),
        editors: text(&entry, "editors").unwrap_or_default(),
        bugs: text(&entry, "bugs").unwrap_or_default(),
        rating: rating(&entry)?,
        vote_count: number(&entry, "votes")?.unwrap_or_default(),
        checksum: None,
        levels: Vec::new(),
        reviews,
        url: text(&entry, "url"),
        idgames_url: text(&entry, "idgamesurl"),
    })
}

fn text(entry: &Entry, field: &str) -> Option<String> {
    match entry.get(field)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings; empty
/// strings count as absent.
fn number<T>(entry: &Entry, field: &'static str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = match entry.get(field) {
        None => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => exn::bail!(ErrorKind::InvalidField { field, value: other.to_string() }),
    };
    raw.parse::<T>().map(Some).or_raise(|| ErrorKind::InvalidField { field, value: raw.clone() })
}

/// The catalog only stores finite ratings; `f64::from_str` also accepts
/// `NaN` and `inf`.
fn rating(entry: &Entry) -> Result<f64> {
    let rating: f64 = number(entry, "rating")?.unwrap_or_default();
    if !rating.is_finite() {
        exn::bail!(ErrorKind::InvalidField { field: "rating", value: rating.to_string() });
    }
    Ok(rating)
}

fn date(entry: &Entry, field: &'static str) -> Result<Option<Date>> {
    let Some(raw) = text(entry, field).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(&raw, format).map(Some).or_raise(|| ErrorKind::InvalidField { field, value: raw.clone() })
}

/// `reviews.review` is an array, a single object when there is exactly one
/// review, or absent.
fn reviews(entry: &Entry) -> Result<Vec<Review>> {
    let Some(container) = entry.get("reviews") else {
        return Ok(Vec::new());
    };
    let items = match container.get("review") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(item @ Value::Object(_)) => vec![item],
        Some(other) => exn::bail!(ErrorKind::InvalidField { field: "reviews", value: other.to_string() }),
    };
    items.into_iter().map(review).collect()
}

fn review(item: &Value) -> Result<Review> {
    let Value::Object(fields) = item else {
        exn::bail!(ErrorKind::InvalidField { field: "review", value: item.to_string() });
    };
    let entry = Entry::new(fields.clone());
    let vote: u8 = number(&entry, "vote")?.unwrap_or_default();
    if vote > 5 {
        exn::bail!(ErrorKind::InvalidField { field: "vote", value: vote.to_string() });
    }
    Ok(Review { text: text(&entry, "text").unwrap_or_default(), vote })
}
