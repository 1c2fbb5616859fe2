//! Fetching one archive entry per request.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::instrument;

/// Retrieves the raw response body for one archive id.
///
/// Any `Err` is a transport failure and ends the crawl.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, id: u64) -> Result<Vec<u8>>;
}

/// Fetches entries from the archive's HTTP API:
/// `GET <api>?action=get&id=<N>[&out=json]`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    api_url: Url,
    json: bool,
}

impl HttpFetcher {
    /// `json` asks for `out=json` responses; without it the API answers in
    /// XML.
    pub fn new(api_url: &str, json: bool, timeout: Duration) -> Result<Self> {
        let api_url = Url::parse(api_url).or_raise(|| ErrorKind::InvalidUrl(api_url.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("idmirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Transport)?;
        Ok(Self { client, api_url, json })
    }

    pub fn request_url(&self, id: u64) -> Url {
        let mut url = self.api_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", "get").append_pair("id", &id.to_string());
            if self.json {
                query.append_pair("out", "json");
            }
        }
        url
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, id: u64) -> Result<Vec<u8>> {
        let response = self.client.get(self.request_url(id)).send().await.or_raise(|| ErrorKind::Transport)?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let body = response.bytes().await.or_raise(|| ErrorKind::Transport)?;
        tracing::trace!(bytes = body.len(), "Response received");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, "https://www.doomworld.com/idgames/api/api.php?action=get&id=15156&out=json")]
    #[case(false, "https://www.doomworld.com/idgames/api/api.php?action=get&id=15156")]
    fn test_request_url(#[case] json: bool, #[case] expected: &str) {
        let fetcher =
            HttpFetcher::new("https://www.doomworld.com/idgames/api/api.php", json, Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.request_url(15156).as_str(), expected);
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpFetcher::new("not a url", true, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidUrl(_)));
    }
}
