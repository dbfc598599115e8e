//! Configuration loading and typed config structures for Brick Wall.
//!
//! The configuration lives in `brickwall.yaml` next to the binary (the path
//! can be changed with `BRICKWALL_CONFIG`). Every field has a default, so a
//! missing file or a partial file is fine. A handful of environment
//! variables override the file for container deployments.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration, mirroring `brickwall.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WallConfig {
    /// Network listener settings.
    #[serde(default)]
    pub server: ListenConfig,

    /// Shape of the brick grid.
    #[serde(default)]
    pub grid: GridConfig,

    /// Auto-reset timing.
    #[serde(default)]
    pub reset: ResetConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WallConfig {
    /// Load configuration from `path` if it exists, otherwise start from
    /// defaults. Process environment overrides are applied and the result
    /// is validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::Invalid`] if validation or an override fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to resolve variables.
    ///
    /// - `PORT` overrides `server.port`
    /// - `HOST` overrides `server.host`
    /// - `BRICKWALL_STATIC_DIR` overrides `server.static_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a valid port number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("PORT={port:?} is not a valid port: {e}"),
            })?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(dir) = lookup("BRICKWALL_STATIC_DIR") {
            self.server.static_dir = dir;
        }
        Ok(())
    }

    /// Check that the grid is non-empty and the reset window is ordered.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "grid must have at least one brick, got {}x{}",
                    self.grid.columns, self.grid.rows
                ),
            });
        }
        if self.reset.min_delay_ms > self.reset.max_delay_ms {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "reset.min_delay_ms ({}) exceeds reset.max_delay_ms ({})",
                    self.reset.min_delay_ms, self.reset.max_delay_ms
                ),
            });
        }
        Ok(())
    }
}

/// Network listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of presentation assets served at `/`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Shape of the brick grid. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Bricks per row.
    #[serde(default = "default_columns")]
    pub columns: u16,

    /// Number of rows.
    #[serde(default = "default_rows")]
    pub rows: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
        }
    }
}

/// Auto-reset timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResetConfig {
    /// Shortest delay before a fallen brick returns, inclusive.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Longest delay before a fallen brick returns, inclusive.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Fixed RNG seed for reproducible delays. Seeded from the OS when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            seed: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "./public".to_owned()
}

const fn default_columns() -> u16 {
    20
}

const fn default_rows() -> u16 {
    12
}

const fn default_min_delay_ms() -> u64 {
    5_000
}

const fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WallConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.grid.columns, 20);
        assert_eq!(config.grid.rows, 12);
        assert_eq!(config.reset.min_delay_ms, 5_000);
        assert_eq!(config.reset.max_delay_ms, 10_000);
        assert_eq!(config.reset.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8081
  static_dir: "./assets"

grid:
  columns: 4
  rows: 3

reset:
  min_delay_ms: 100
  max_delay_ms: 200
  seed: 7

logging:
  level: "debug"
  json: true
"#;
        let config = WallConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.static_dir, "./assets");
        assert_eq!(config.grid, GridConfig { columns: 4, rows: 3 });
        assert_eq!(config.reset.min_delay_ms, 100);
        assert_eq!(config.reset.max_delay_ms, 200);
        assert_eq!(config.reset.seed, Some(7));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = WallConfig::parse("grid:\n  rows: 2\n").unwrap_or_default();
        assert_eq!(config.grid.columns, 20);
        assert_eq!(config.grid.rows, 2);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = WallConfig::parse("grid: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn overrides_replace_listener_settings() {
        let env: BTreeMap<&str, &str> = [
            ("PORT", "4000"),
            ("HOST", "::1"),
            ("BRICKWALL_STATIC_DIR", "/srv/wall"),
        ]
        .into_iter()
        .collect();

        let mut config = WallConfig::default();
        let result = config.apply_overrides(|key| env.get(key).map(|v| (*v).to_owned()));
        assert!(result.is_ok());
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, "::1");
        assert_eq!(config.server.static_dir, "/srv/wall");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = WallConfig::default();
        let result = config.apply_overrides(|key| (key == "PORT").then(|| "http".to_owned()));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn empty_grid_fails_validation() {
        let mut config = WallConfig::default();
        config.grid.columns = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn inverted_reset_window_fails_validation() {
        let mut config = WallConfig::default();
        config.reset.min_delay_ms = 10_000;
        config.reset.max_delay_ms = 5_000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let path = Path::new("definitely-not-here/brickwall.yaml");
        let config = WallConfig::load(path);
        assert!(config.is_ok());
    }
}
