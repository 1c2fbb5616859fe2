use super::Review;
use time::Date;

/// Anything addressed by a `dir` + `filename` pair within the archive.
pub trait PathResolver {
    /// Directory, including its trailing slash (`levels/doom2/a-c/`).
    fn dir(&self) -> &str;
    fn filename(&self) -> &str;
    /// Canonical path: `dir` immediately followed by `filename`.
    fn path(&self) -> String {
        format!("{}{}", self.dir(), self.filename())
    }
}

/// One entry in the remote archive.
///
/// Field declaration order is the catalog's column order, from `id` through
/// `checksum`. The `levels` and `reviews` collections are stored in their
/// own tables; `url` and `idgames_url` are transient and never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArchiveRecord {
    /// Remote identifier; unique, positive and never reused.
    pub id: u64,
    pub title: String,
    pub dir: String,
    pub filename: String,
    /// Container size in bytes.
    pub size: u64,
    /// Upload time as a Unix timestamp.
    pub age: i64,
    /// Release date claimed by the author's text file.
    pub date: Option<Date>,
    pub author: String,
    pub email: String,
    pub description: String,
    pub credits: String,
    pub base: String,
    pub buildtime: String,
    pub editors: String,
    pub bugs: String,
    /// Mean review score.
    pub rating: f64,
    pub vote_count: u32,
    /// Checksum of the raw container file, once inspected.
    pub checksum: Option<String>,
    /// Level markers found inside the container, in directory order.
    pub levels: Vec<String>,
    pub reviews: Vec<Review>,
    pub url: Option<String>,
    pub idgames_url: Option<String>,
}

impl ArchiveRecord {
    pub fn new(id: u64, dir: impl Into<String>, filename: impl Into<String>) -> Self {
        Self { id, dir: dir.into(), filename: filename.into(), ..Default::default() }
    }

    /// Attach the results of inspecting the record's container.
    pub fn with_inspection(mut self, checksum: impl Into<String>, levels: Vec<String>) -> Self {
        self.checksum = Some(checksum.into());
        self.levels = levels;
        self
    }

    /// Strip the fields the catalog does not store; what remains is exactly
    /// what a catalog lookup returns.
    pub fn without_transient(mut self) -> Self {
        self.url = None;
        self.idgames_url = None;
        self
    }
}

impl PathResolver for ArchiveRecord {
    fn dir(&self) -> &str {
        &self.dir
    }

    fn filename(&self) -> &str {
        &self.filename
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path() {
        let record = ArchiveRecord::new(9876, "levels/doom2/Ports/megawads/", "av.zip");
        assert_eq!(record.path(), "levels/doom2/Ports/megawads/av.zip");
    }

    #[test]
    fn test_with_inspection() {
        let record = ArchiveRecord::new(1, "levels/doom/", "e1.zip")
            .with_inspection("af1349b9", vec!["E1M1".to_string(), "E1M2".to_string()]);
        assert_eq!(record.checksum.as_deref(), Some("af1349b9"));
        assert_eq!(record.levels.len(), 2);
    }

    #[test]
    fn test_without_transient() {
        let mut record = ArchiveRecord::new(1, "levels/doom/", "e1.zip");
        record.url = Some("https://example.org/e1.zip".to_string());
        record.idgames_url = Some("idgames://1".to_string());
        let stripped = record.clone().without_transient();
        assert_eq!(stripped.url, None);
        assert_eq!(stripped.idgames_url, None);
        assert_eq!(stripped.dir, record.dir);
    }
}
