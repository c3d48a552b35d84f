//! Simple configuration persistence for stemdeck
//!
//! Stores user preferences only; mixer sessions are never saved.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    /// Folder stems are written to and opened from by default
    pub default_folder: Option<PathBuf>,
    /// Drift tolerance override in milliseconds
    pub drift_tolerance_ms: Option<u64>,
    /// Theme name
    pub theme: Option<String>,
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stemdeck")
            .join("config.txt")
    }

    /// Drift tolerance, if configured
    pub fn drift_tolerance(&self) -> Option<Duration> {
        self.drift_tolerance_ms.map(Duration::from_millis)
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim() {
                "default_folder" => config.default_folder = Some(PathBuf::from(value)),
                "drift_tolerance_ms" => match value.parse() {
                    Ok(ms) => config.drift_tolerance_ms = Some(ms),
                    Err(_) => tracing::warn!(value, "ignoring invalid drift_tolerance_ms"),
                },
                "theme" => config.theme = Some(value.to_string()),
                _ => {} // Ignore unknown keys
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = vec!["# stemdeck configuration".to_string()];

        if let Some(ref folder) = self.default_folder {
            lines.push(format!("default_folder={}", folder.display()));
        }
        if let Some(ms) = self.drift_tolerance_ms {
            lines.push(format!("drift_tolerance_ms={}", ms));
        }
        if let Some(ref theme) = self.theme {
            lines.push(format!("theme={}", theme));
        }

        lines.join("\n")
    }
}
