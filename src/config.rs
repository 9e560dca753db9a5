//! Server configuration loaded from TOML.

use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "CHESS_SERVER_CONFIG";

/// File read when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "chess-server.toml";

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub game: GameSettings,
    pub oracle: OracleConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("./static"),
            game: GameSettings::default(),
            oracle: OracleConfig::default(),
        }
    }
}

/// Per-session timing and oracle search depths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Seconds a player has for each move.
    pub turn_seconds: u32,
    /// Length of one clock tick in milliseconds.
    pub tick_millis: u64,
    pub hint_depth: u8,
    pub analysis_depth: u8,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            turn_seconds: 60,
            tick_millis: 1000,
            hint_depth: 10,
            analysis_depth: 15,
        }
    }
}

/// Which move-evaluation oracle to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    None,
    Builtin,
    Uci,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub kind: OracleKind,
    /// Path to a UCI engine binary, required when `kind = "uci"`.
    pub uci_path: Option<PathBuf>,
    /// Search depth cap for the built-in oracle.
    pub builtin_depth: u8,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::None,
            uci_path: None,
            builtin_depth: 3,
        }
    }
}

impl ServerConfig {
    /// Load and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$CHESS_SERVER_CONFIG` (or the default path), falling back to
    /// defaults when the file does not exist.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::load_or_default(&path)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.game.turn_seconds == 0 {
            return Err(ConfigError::Validation(
                "game.turn_seconds must be > 0".to_string(),
            ));
        }
        if self.game.tick_millis == 0 {
            return Err(ConfigError::Validation(
                "game.tick_millis must be > 0".to_string(),
            ));
        }
        if self.oracle.kind == OracleKind::Uci && self.oracle.uci_path.is_none() {
            return Err(ConfigError::Validation(
                "oracle.uci_path is required when oracle.kind = \"uci\"".to_string(),
            ));
        }
        if !(1..=5).contains(&self.oracle.builtin_depth) {
            return Err(ConfigError::Validation(format!(
                "oracle.builtin_depth must be between 1 and 5, got {}",
                self.oracle.builtin_depth
            )));
        }
        Ok(())
    }

    /// `host:port` as passed to `HttpServer::bind`.
    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
