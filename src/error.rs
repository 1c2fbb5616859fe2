use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What the command was doing when it failed.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not load schema definition")]
    Schema,
    #[display("catalog error")]
    Catalog,
    #[display("crawl failed")]
    Crawl,
    /// The crawl ran but stopped on an error.
    #[display("crawl {_0}")]
    Stopped(#[error(not(source))] String),
    #[display("could not inspect container")]
    Inspect,
    #[display("could not write output")]
    Output,
    #[display("id {_0} is not in the catalog")]
    NotCataloged(#[error(not(source))] u64),
    #[display("unsupported: {_0}")]
    Unsupported(#[error(not(source))] &'static str),
}
