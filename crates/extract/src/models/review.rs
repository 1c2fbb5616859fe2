/// A user review attached to exactly one archive entry.
///
/// Reviews have no identity of their own; their position in
/// [`ArchiveRecord::reviews`](super::ArchiveRecord::reviews) is their
/// order, and the catalog numbers them from 1 per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub text: String,
    /// Score from 0 to 5.
    pub vote: u8,
}
impl Review {
    pub fn new(text: impl Into<String>, vote: u8) -> Self {
        Self { text: text.into(), vote }
    }
}
