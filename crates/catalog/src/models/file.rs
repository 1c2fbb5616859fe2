use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use idmirror_extract::ArchiveRecord;
use time::UtcDateTime;

/// The `files` row of one archive entry, columns in declaration order.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub(crate) struct CatalogRow {
    pub id: i64,
    pub title: String,
    pub dir: String,
    pub filename: String,
    pub size: i64,
    pub age: i64,
    /// Midnight UTC of the release date, as a Unix timestamp.
    pub date: Option<i64>,
    pub author: String,
    pub email: String,
    pub description: String,
    pub credits: String,
    pub base: String,
    pub buildtime: String,
    pub editors: String,
    pub bugs: String,
    pub rating: f64,
    pub vote_count: i64,
    pub checksum: Option<String>,
}
impl TryFrom<&ArchiveRecord> for CatalogRow {
    type Error = Error;
    fn try_from(record: &ArchiveRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: i64::try_from(record.id).or_raise(|| ErrorKind::InvalidData("id"))?,
            title: record.title.clone(),
            dir: record.dir.clone(),
            filename: record.filename.clone(),
            size: i64::try_from(record.size).or_raise(|| ErrorKind::InvalidData("size"))?,
            age: record.age,
            date: record.date.map(|date| date.midnight().as_utc().unix_timestamp()),
            author: record.author.clone(),
            email: record.email.clone(),
            description: record.description.clone(),
            credits: record.credits.clone(),
            base: record.base.clone(),
            buildtime: record.buildtime.clone(),
            editors: record.editors.clone(),
            bugs: record.bugs.clone(),
            rating: record.rating,
            vote_count: i64::from(record.vote_count),
            checksum: record.checksum.clone(),
        })
    }
}
/// Reviews and levels live in their own tables; the record comes back with
/// both empty.
impl TryFrom<CatalogRow> for ArchiveRecord {
    type Error = Error;
    fn try_from(row: CatalogRow) -> Result<Self, Self::Error> {
        let date = row
            .date
            .map(|timestamp| UtcDateTime::from_unix_timestamp(timestamp).map(|moment| moment.date()))
            .transpose()
            .or_raise(|| ErrorKind::InvalidData("date"))?;
        Ok(Self {
            id: u64::try_from(row.id).or_raise(|| ErrorKind::InvalidData("id"))?,
            title: row.title,
            dir: row.dir,
            filename: row.filename,
            size: u64::try_from(row.size).or_raise(|| ErrorKind::InvalidData("size"))?,
            age: row.age,
            date,
            author: row.author,
            email: row.email,
            description: row.description,
            credits: row.credits,
            base: row.base,
            buildtime: row.buildtime,
            editors: row.editors,
            bugs: row.bugs,
            rating: row.rating,
            vote_count: u32::try_from(row.vote_count).or_raise(|| ErrorKind::InvalidData("vote count"))?,
            checksum: row.checksum,
            levels: Vec::new(),
            reviews: Vec::new(),
            url: None,
            idgames_url: None,
        })
    }
}
