mod file;
mod vote;

pub(crate) use self::file::CatalogRow;
pub(crate) use self::vote::VoteRow;
