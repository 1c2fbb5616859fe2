//! Layered configuration for idmirror.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a TOML file (`idmirror.toml` in the user's config directory unless
//!    another is given),
//! 3. `IDMIRROR_*` environment variables (`IDMIRROR_START_ID=1200`).
//!
//! Command line flags are applied by the binary on top of the result.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "IDMIRROR_";
pub const DEFAULT_API_URL: &str = "https://www.doomworld.com/idgames/api/api.php";
/// Requests allowed in debug mode when no explicit cap is configured.
pub const DEBUG_REQUEST_CAP: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    /// Ask the API for JSON (`out=json`) rather than XML.
    pub json: bool,
    pub start_id: u64,
    /// Upper bound of the random pause between requests, in seconds.
    pub jitter: f64,
    pub max_requests: Option<u64>,
    /// Caps the crawl at [`DEBUG_REQUEST_CAP`] unless `max_requests` says
    /// otherwise.
    pub debug: bool,
    pub error_budget: bool,
    pub database: PathBuf,
    /// Schema document to use instead of the built-in one.
    pub schema: Option<PathBuf>,
    /// Local mirror of the archive's files, for checksums and level lists.
    pub mirror: Option<PathBuf>,
    /// Per-request timeout, in seconds.
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        let database = project_dirs()
            .map(|dirs| dirs.data_dir().join("catalog.db"))
            .unwrap_or_else(|| PathBuf::from("catalog.db"));
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            json: true,
            start_id: 1,
            jitter: 5.0,
            max_requests: None,
            debug: false,
            error_budget: true,
            database,
            schema: None,
            mirror: None,
            timeout: 30,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "idmirror", "idmirror")
}

impl Config {
    /// Where the configuration file is looked for when none is given.
    pub fn default_file() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("idmirror.toml"))
    }

    /// Load and validate the configuration.
    ///
    /// An explicit `file` must exist; the default file is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_file(),
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &file {
            tracing::debug!(path = %path.display(), "Reading configuration file");
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX)).extract().or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_id == 0 {
            exn::bail!(ErrorKind::Invalid("start_id must be at least 1".to_string()));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            exn::bail!(ErrorKind::Invalid(format!("jitter must be a non-negative number of seconds, got {}", self.jitter)));
        }
        if self.max_requests == Some(0) {
            exn::bail!(ErrorKind::Invalid("max_requests must be at least 1".to_string()));
        }
        if self.timeout == 0 {
            exn::bail!(ErrorKind::Invalid("timeout must be at least 1 second".to_string()));
        }
        url::Url::parse(&self.api_url).or_raise(|| ErrorKind::Invalid(format!("api_url is not a URL: {}", self.api_url)))?;
        Ok(())
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_secs_f64(self.jitter)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// The effective request cap, if any.
    pub fn request_cap(&self) -> Option<u64> {
        self.max_requests.or(self.debug.then_some(DEBUG_REQUEST_CAP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.start_id, 1);
        assert_eq!(config.jitter(), Duration::from_secs(5));
        assert_eq!(config.request_cap(), None);
    }

    #[rstest]
    #[case(false, None, None)]
    #[case(true, None, Some(DEBUG_REQUEST_CAP))]
    #[case(true, Some(3), Some(3))]
    #[case(false, Some(3), Some(3))]
    fn test_request_cap(#[case] debug: bool, #[case] max_requests: Option<u64>, #[case] expected: Option<u64>) {
        let config = Config { debug, max_requests, ..Config::default() };
        assert_eq!(config.request_cap(), expected);
    }

    #[rstest]
    #[case(Config { start_id: 0, ..Config::default() })]
    #[case(Config { jitter: -1.0, ..Config::default() })]
    #[case(Config { jitter: f64::NAN, ..Config::default() })]
    #[case(Config { max_requests: Some(0), ..Config::default() })]
    #[case(Config { timeout: 0, ..Config::default() })]
    #[case(Config { api_url: "not a url".to_string(), ..Config::default() })]
    fn test_invalid(#[case] config: Config) {
        let err = config.validate().unwrap_err();
        assert!(matches!(*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file("idmirror.toml", "start_id = 1200\njitter = 0.5\nmirror = \"/srv/idgames\"\n")?;
            jail.set_env("IDMIRROR_START_ID", "1300");
            let config = Config::load(Some(Path::new("idmirror.toml"))).unwrap();
            assert_eq!(config.start_id, 1300);
            assert_eq!(config.jitter, 0.5);
            assert_eq!(config.mirror, Some(PathBuf::from("/srv/idgames")));
            assert!(config.error_budget);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("idmirror.toml", "start_id = 0\n")?;
            let err = Config::load(Some(Path::new("idmirror.toml"))).unwrap_err();
            assert!(matches!(*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }
}
