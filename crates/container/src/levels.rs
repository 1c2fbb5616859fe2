use regex::Regex;
use std::sync::LazyLock;

// Episode/mission markers (Doom, Heretic) and map markers (Doom II and later).
static LEVEL_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:E[1-9]M[1-9]|MAP[0-9]{2})$").unwrap());

/// Returns `true` if the lump name marks the start of a level.
pub fn is_level_marker(name: &str) -> bool {
    LEVEL_MARKER.is_match(&name.to_ascii_uppercase())
}
