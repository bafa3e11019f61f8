use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use monocle_eval::EvaluatorConfig;
use monocle_jwe::decrypt::DEFAULT_MAX_INFLATED_BYTES;
use monocle_jwe::DecryptorOptions;

use crate::error::{RootError, RootResult};

/// Environment variable that overrides `key.private_key_path`.
pub const PRIVATE_KEY_PATH_ENV: &str = "MONOCLE_PRIVATE_KEY_PATH";

/// Hard ceiling for `decryptor.max_inflated_bytes`.
const MAX_INFLATED_LIMIT: usize = 16 * 1024 * 1024;

/// Where the bundle private key lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyConfig {
    /// PEM file holding the P-256 private key (PKCS#8 or SEC1).
    #[serde(default = "default_private_key_path")]
    pub private_key_path: PathBuf,
}

fn default_private_key_path() -> PathBuf {
    dirs_or_default(".monocle/private_key.pem")
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            private_key_path: default_private_key_path(),
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a proxy that sets these headers itself.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            trust_forwarded_for: false,
        }
    }
}

impl HttpConfig {
    /// `bind` is a bare IPv4 or IPv6 address; brackets around v6 are allowed.
    pub fn socket_addr(&self) -> RootResult<SocketAddr> {
        let host = self.bind.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let ip: IpAddr = host
            .parse()
            .map_err(|e| RootError::Config(format!("invalid bind address '{}': {}", self.bind, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Limits applied while opening bundles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecryptorConfig {
    /// Ceiling on DEFLATE output, in bytes.
    #[serde(default = "default_max_inflated_bytes")]
    pub max_inflated_bytes: usize,
}

fn default_max_inflated_bytes() -> usize {
    DEFAULT_MAX_INFLATED_BYTES
}

impl Default for DecryptorConfig {
    fn default() -> Self {
        Self {
            max_inflated_bytes: default_max_inflated_bytes(),
        }
    }
}

impl From<&DecryptorConfig> for DecryptorOptions {
    fn from(config: &DecryptorConfig) -> Self {
        DecryptorOptions {
            max_inflated_bytes: config.max_inflated_bytes,
        }
    }
}

/// Top-level configuration for the Monocle binary.
///
/// Loaded from a TOML file (typically `~/.monocle/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub key: KeyConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub evaluator: EvaluatorConfig,

    #[serde(default)]
    pub decryptor: DecryptorConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(RootError::Io)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RootError::Io)?;
        }
        std::fs::write(path, contents).map_err(RootError::Io)?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> RootResult<()> {
        self.evaluator
            .validate()
            .map_err(|e| RootError::Config(e.to_string()))?;
        if self.decryptor.max_inflated_bytes == 0 {
            return Err(RootError::Config(
                "max_inflated_bytes must be > 0".into(),
            ));
        }
        if self.decryptor.max_inflated_bytes > MAX_INFLATED_LIMIT {
            return Err(RootError::Config(format!(
                "max_inflated_bytes must be <= {}, got {}",
                MAX_INFLATED_LIMIT, self.decryptor.max_inflated_bytes
            )));
        }
        if self.http.bind.trim().is_empty() {
            return Err(RootError::Config("http.bind must not be empty".into()));
        }
        if self.key.private_key_path.as_os_str().is_empty() {
            return Err(RootError::Config(
                "key.private_key_path must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Replace the key path when an override is present.
    pub fn with_key_path_override(mut self, path: Option<PathBuf>) -> Self {
        if let Some(p) = path.filter(|p| !p.as_os_str().is_empty()) {
            self.key.private_key_path = p;
        }
        self
    }

    /// Apply `MONOCLE_PRIVATE_KEY_PATH` if set.
    pub fn apply_env(self) -> Self {
        let path = std::env::var_os(PRIVATE_KEY_PATH_ENV).map(PathBuf::from);
        self.with_key_path_override(path)
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".monocle/config.toml")
    }
}
