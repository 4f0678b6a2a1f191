use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checksum::DEFAULT_STREAM_CAP;
use crate::max_age::MaxAge;
use crate::transport::TransportOptions;
use crate::updater::UpdaterOptions;

/// One file kept in sync by `freshfetch sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Local path of the file (its sidecar lives at `<path>.meta`).
    pub path: PathBuf,
    /// Direct HTTP/HTTPS URL of the remote copy.
    pub url: String,
    /// Minimum time between checks, e.g. "1 day" or "12h". Empty = check every run.
    #[serde(default)]
    pub max_age: String,
}

/// Global configuration loaded from `~/.config/freshfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreshfetchConfig {
    /// Seconds allowed for establishing a connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Hard cap on a whole request in seconds, body included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Abort transfers slower than this many bytes/s for `low_speed_time_secs`.
    #[serde(default = "default_low_speed_limit")]
    pub low_speed_limit: u32,
    #[serde(default = "default_low_speed_time_secs")]
    pub low_speed_time_secs: u64,
    /// Bytes of a remote body hashed when the server sends no Last-Modified.
    #[serde(default = "default_hash_cap_bytes")]
    pub hash_cap_bytes: u64,
    /// Files handled by `freshfetch sync`.
    #[serde(default)]
    pub files: Vec<TrackedFile>,
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_low_speed_limit() -> u32 {
    1024
}

fn default_low_speed_time_secs() -> u64 {
    60
}

fn default_hash_cap_bytes() -> u64 {
    DEFAULT_STREAM_CAP
}

impl Default for FreshfetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            low_speed_limit: default_low_speed_limit(),
            low_speed_time_secs: default_low_speed_time_secs(),
            hash_cap_bytes: default_hash_cap_bytes(),
            files: Vec::new(),
        }
    }
}

impl FreshfetchConfig {
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            low_speed_limit: self.low_speed_limit,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            ..TransportOptions::default()
        }
    }

    pub fn updater_options(&self) -> UpdaterOptions {
        UpdaterOptions {
            hash_cap_bytes: self.hash_cap_bytes,
        }
    }

    /// Reject entries that can never work: non-HTTP URLs, empty paths, bad max ages.
    pub fn validate(&self) -> Result<()> {
        for (i, f) in self.files.iter().enumerate() {
            validate_url(&f.url).with_context(|| format!("files[{}]", i))?;
            if f.path.as_os_str().is_empty() {
                anyhow::bail!("files[{}]: empty path", i);
            }
            MaxAge::parse(&f.max_age).with_context(|| format!("files[{}]", i))?;
        }
        Ok(())
    }
}

/// Check that `raw` is an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<()> {
    let url = url::Url::parse(raw).with_context(|| format!("invalid URL {:?}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("unsupported URL scheme {:?} in {}", other, raw),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("freshfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`.
pub fn load_from(path: &Path) -> Result<FreshfetchConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: FreshfetchConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FreshfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FreshfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}
