use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::manifest::DEFAULT_RETENTION_DAYS;
use crate::viewer::{DEFAULT_ZOOM_STEP, MAX_SCALE, MIN_SCALE};

#[derive(Debug, Default, Serialize, Deserialize)]
/// Persisted settings for Chartboard.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    /// Base URL or directory holding `list.json` and `contracts/`.
    pub root: Option<String>,
    pub retention_days: Option<i64>,
    pub zoom_step: Option<f32>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("chartboard").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Self {
        toml::from_str(contents).unwrap_or_default()
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }

    pub fn retention_days(&self) -> i64 {
        self.retention_days
            .filter(|d| *d >= 0)
            .unwrap_or(DEFAULT_RETENTION_DAYS)
    }

    /// A step that could never move the scale is replaced by the default.
    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
            .filter(|s| s.is_finite() && *s > 0.0 && *s <= MAX_SCALE - MIN_SCALE)
            .unwrap_or(DEFAULT_ZOOM_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = AppConfig::parse("root = \"https://charts.example.net\"\nzoom_step = 0.5\n");
        assert_eq!(cfg.root.as_deref(), Some("https://charts.example.net"));
        assert_eq!(cfg.zoom_step(), 0.5);
        assert_eq!(cfg.retention_days(), DEFAULT_RETENTION_DAYS);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let cfg = AppConfig::parse("root = [unterminated");
        assert!(cfg.root.is_none());
        assert_eq!(cfg.zoom_step(), DEFAULT_ZOOM_STEP);
    }

    #[test]
    fn out_of_range_values_are_ignored() {
        let cfg = AppConfig {
            retention_days: Some(-3),
            zoom_step: Some(0.0),
            ..Default::default()
        };
        assert_eq!(cfg.retention_days(), DEFAULT_RETENTION_DAYS);
        assert_eq!(cfg.zoom_step(), DEFAULT_ZOOM_STEP);

        let cfg = AppConfig {
            zoom_step: Some(f32::NAN),
            ..Default::default()
        };
        assert_eq!(cfg.zoom_step(), DEFAULT_ZOOM_STEP);
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = AppConfig {
            window_width: Some(1400.0),
            retention_days: Some(30),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = AppConfig::parse(&text);
        assert_eq!(back.window_width, Some(1400.0));
        assert_eq!(back.retention_days(), 30);
    }
}
