//! Server configuration loaded from a JSON file.
//! Used by: main, state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::access::AccessConfig;
use crate::error::{Error, Result};

pub const DEFAULT_PATH: &str = "conf.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub address: String,
    pub template_dir: PathBuf,
    pub file_dir: PathBuf,
    pub log_dir: PathBuf,

    pub super_admin_account: String,
    pub super_admin_password: String,
    pub admin_password: String,
    /// Identities whose override no administrator may change.
    pub protected_identities: Vec<String>,
    pub max_upload_bytes: usize,

    pub access_count_limit: u32,
    pub time_limit_secs: u64,
    pub restore_delay_secs: u64,
    pub existence_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:4000".into(),
            template_dir: "./template".into(),
            file_dir: "./file".into(),
            log_dir: "./log".into(),
            super_admin_account: "root".into(),
            super_admin_password: "change-me".into(),
            admin_password: "change-me-too".into(),
            protected_identities: vec!["127.0.0.1".into(), "::1".into()],
            max_upload_bytes: 32 << 20,
            access_count_limit: 5,
            time_limit_secs: 3,
            restore_delay_secs: 60,
            existence_secs: 180,
            sweep_interval_secs: 60,
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    /// Runs before logging is up, so the caller reports which case applied.
    /// `BIND_ADDR` overrides the listen address.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.address = addr;
        }
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.access_count_limit == 0 {
            return Err(Error::Config("access_count_limit must be at least 1".into()));
        }
        let durations = [
            ("time_limit_secs", self.time_limit_secs),
            ("restore_delay_secs", self.restore_delay_secs),
            ("existence_secs", self.existence_secs),
            ("sweep_interval_secs", self.sweep_interval_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, secs)| *secs == 0) {
            return Err(Error::Config(format!("{name} must be positive")));
        }
        Ok(())
    }
}

impl From<&Config> for AccessConfig {
    fn from(config: &Config) -> Self {
        Self {
            access_count_limit: config.access_count_limit,
            time_limit: Duration::from_secs(config.time_limit_secs),
            restore_delay: Duration::from_secs(config.restore_delay_secs),
            existence: Duration::from_secs(config.existence_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }
}
