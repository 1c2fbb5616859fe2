use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use idmirror_extract::Review;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub(crate) struct VoteRow {
    pub vote_id: i64,
    pub text: String,
    pub vote: i64,
}
impl VoteRow {
    /// `position` is the review's zero-based index within its record.
    pub fn new(position: usize, review: &Review) -> Result<Self, Error> {
        Ok(Self {
            vote_id: i64::try_from(position + 1).or_raise(|| ErrorKind::InvalidData("vote id"))?,
            text: review.text.clone(),
            vote: i64::from(review.vote),
        })
    }
}
impl TryFrom<VoteRow> for Review {
    type Error = Error;
    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Self { text: row.text, vote: u8::try_from(row.vote).or_raise(|| ErrorKind::InvalidData("vote"))? })
    }
}
