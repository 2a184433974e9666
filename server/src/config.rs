//! Server configuration loaded from the environment.
//!
//! Values come from process env, optionally seeded from a `.env` file in the
//! working directory. Missing variables take defaults; present but malformed
//! numeric values are rejected so a typo never silently becomes a default.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

use room::consts::{DEFAULT_COLLISION_RADIUS, DEFAULT_ROOM_HEIGHT, DEFAULT_ROOM_WIDTH};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "room_data";
const DEFAULT_TEMPLATE: &str = "main.json";
const DEFAULT_PERSIST_INTERVAL_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory holding one `<room>.json` per persisted room.
    pub data_dir: PathBuf,
    /// File name inside `data_dir` used as the layout for new rooms.
    pub template: String,
    pub room_width: f64,
    pub room_height: f64,
    pub collision_radius: f64,
    pub persist_interval: Duration,
    /// Static front-end assets served at `/`, if any.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            template: DEFAULT_TEMPLATE.to_owned(),
            room_width: DEFAULT_ROOM_WIDTH,
            room_height: DEFAULT_ROOM_HEIGHT,
            collision_radius: DEFAULT_COLLISION_RADIUS,
            persist_interval: Duration::from_millis(DEFAULT_PERSIST_INTERVAL_MS),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment (after loading `.env`, if present).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Used by `from_env` and tests.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let persist_ms = env_parse(&lookup, "PERSIST_INTERVAL_MS", DEFAULT_PERSIST_INTERVAL_MS)?;
        Ok(Self {
            port: env_parse(&lookup, "PORT", defaults.port)?,
            data_dir: lookup("ROOM_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            template: lookup("ROOM_TEMPLATE").unwrap_or(defaults.template),
            room_width: env_parse(&lookup, "ROOM_WIDTH", defaults.room_width)?,
            room_height: env_parse(&lookup, "ROOM_HEIGHT", defaults.room_height)?,
            collision_radius: env_parse(&lookup, "COLLISION_RADIUS", defaults.collision_radius)?,
            persist_interval: Duration::from_millis(persist_ms),
            static_dir: lookup("STATIC_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    /// Path of the template room file, if one is configured.
    #[must_use]
    pub fn template_path(&self) -> Option<PathBuf> {
        (!self.template.trim().is_empty()).then(|| self.data_dir.join(&self.template))
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
