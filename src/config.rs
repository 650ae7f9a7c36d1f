use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

use crate::duration::deserialize_duration;
use crate::networth::DEFAULT_CURRENCY;
use crate::refresh::DEFAULT_INTERVAL;
use crate::sync::simplefin::DEFAULT_REQUEST_TIMEOUT;

pub const ACCESS_URL_ENV: &str = "SIMPLEFIN_ACCESS_URL";
pub const PORT_ENV: &str = "PORT";

fn default_history_file() -> PathBuf {
    PathBuf::from("networth-history.json")
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_fallback_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

/// SimpleFIN connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimpleFinConfig {
    /// Access URL with embedded credentials. Prefer the environment variable
    /// over committing this to a file.
    pub access_url: Option<String>,

    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
}

impl Default for SimpleFinConfig {
    fn default() -> Self {
        Self {
            access_url: None,
            request_timeout: default_request_timeout(),
        }
    }
}

/// Refresh timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    #[serde(default = "default_interval", deserialize_with = "deserialize_duration")]
    pub interval: Duration,

    /// Each delay is shifted by a random amount up to this much either way.
    #[serde(deserialize_with = "deserialize_duration")]
    pub jitter: Duration,

    /// How long shutdown waits for an in-flight refresh.
    #[serde(
        default = "default_shutdown_grace",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_grace: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            jitter: Duration::ZERO,
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

/// Application configuration as written in `networth.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// History document. If relative, resolved from the config file location.
    pub history_file: PathBuf,

    pub listen: SocketAddr,

    /// Currency reported when no account qualifies.
    pub fallback_currency: String,

    pub simplefin: SimpleFinConfig,

    pub refresh: RefreshConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            listen: default_listen(),
            fallback_currency: default_fallback_currency(),
            simplefin: SimpleFinConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Resolve the history file path against `config_dir` if it is relative.
    pub fn resolve_history_file(&self, config_dir: &Path) -> PathBuf {
        if self.history_file.is_absolute() {
            self.history_file.clone()
        } else {
            config_dir.join(&self.history_file)
        }
    }
}

/// Loaded configuration with resolved paths and environment overrides applied.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub history_file: PathBuf,
    pub listen: SocketAddr,
    pub fallback_currency: String,
    pub access_url: Option<SecretString>,
    pub request_timeout: Duration,
    pub refresh: RefreshConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./networth.toml` if it exists in current directory
/// 2. `~/.local/share/networth/networth.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("networth.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("networth").join("networth.toml");
    }

    local_config
}

impl ResolvedConfig {
    fn from_config(config: Config, config_dir: &Path) -> Self {
        Self {
            history_file: config.resolve_history_file(config_dir),
            listen: config.listen,
            fallback_currency: config.fallback_currency,
            access_url: config
                .simplefin
                .access_url
                .filter(|url| !url.trim().is_empty())
                .map(SecretString::from),
            request_timeout: config.simplefin.request_timeout,
            refresh: config.refresh,
        }
    }

    /// Load and resolve config from a file path.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Ok(Self::from_config(config, config_dir))
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// Without a file, relative paths resolve against the current directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            let cwd = std::env::current_dir().context("Failed to get current directory")?;
            Ok(Self::from_config(Config::default(), &cwd))
        }
    }

    /// Apply `SIMPLEFIN_ACCESS_URL` and `PORT` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ACCESS_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.access_url = Some(SecretString::from(url));
        }

        if let Some(port) = lookup(PORT_ENV) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {port:?}"))?;
            self.listen.set_port(port);
        }

        Ok(())
    }

    /// The access URL, or an error explaining how to provide one.
    pub fn require_access_url(&self) -> Result<&SecretString> {
        self.access_url.as_ref().with_context(|| {
            format!(
                "No SimpleFIN access URL configured. Set {ACCESS_URL_ENV} or [simplefin].access_url \
                 (run `networth claim <SETUP_TOKEN>` to obtain one)"
            )
        })
    }
}
