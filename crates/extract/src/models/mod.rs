mod record;
mod review;

pub use self::record::{ArchiveRecord, PathResolver};
pub use self::review::Review;
