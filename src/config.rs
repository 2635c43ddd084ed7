//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the tide-config.toml file.
//! It provides the sampling and refraction constants both engines run with, plus the
//! station directory used to turn a station id into coordinates and a timezone.
//!
//! Nothing here is global: the binary loads a [`Config`] once and passes an
//! [`EngineConfig`] into the engines it builds.

use crate::error::ConfigError;
use crate::station::StationEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tide-config.toml";

/// Application configuration loaded from tide-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Tide curve sampling
    #[serde(default)]
    pub tide: TideConfig,
    /// Astronomical search and sampling
    #[serde(default)]
    pub astro: AstroConfig,
    /// Known tide stations, keyed by NOAA station id
    #[serde(default)]
    pub stations: Vec<StationEntry>,
}

/// Tide curve sampling settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TideConfig {
    /// Minutes between samples of the dense tide table
    pub step_minutes: u32,
}

impl Default for TideConfig {
    fn default() -> Self {
        TideConfig { step_minutes: 10 }
    }
}

/// Astronomical engine settings
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AstroConfig {
    /// Minutes between altitude samples when searching for rise/set.
    /// No body's altitude changes faster than ~15.1°/h, so 20 minutes
    /// bounds the change between samples to about 5°.
    pub search_step_minutes: u32,
    /// Minutes between points of the daily altitude/azimuth tracks
    pub track_interval_minutes: u32,
    /// Atmospheric refraction at the horizon in degrees (34′)
    pub refraction_deg: f64,
    /// Apparent radius of the sun in degrees (16′)
    pub sun_semidiameter_deg: f64,
    /// Horizon dip per square-root meter of observer elevation, degrees
    pub dip_coefficient_deg: f64,
    /// Local hour at which the daily moon phase is evaluated
    pub phase_reference_hour: u32,
    /// Number of lunation icons the renderer has
    pub lunation_icons: u32,
}

impl Default for AstroConfig {
    fn default() -> Self {
        AstroConfig {
            search_step_minutes: 10,
            track_interval_minutes: 60,
            refraction_deg: 34.0 / 60.0,
            sun_semidiameter_deg: 16.0 / 60.0,
            dip_coefficient_deg: 0.0293,
            phase_reference_hour: 22,
            lunation_icons: 28,
        }
    }
}

/// The subset of [`Config`] the engines need
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineConfig {
    pub tide: TideConfig,
    pub astro: AstroConfig,
}

impl EngineConfig {
    /// Reject settings the engines cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tide = &self.tide;
        let astro = &self.astro;
        if !(1..=60).contains(&tide.step_minutes) {
            return Err(invalid("tide.step_minutes", "must be 1..=60"));
        }
        if !(1..=20).contains(&astro.search_step_minutes) {
            return Err(invalid(
                "astro.search_step_minutes",
                "must be 1..=20 so no horizon crossing is skipped",
            ));
        }
        if !(1..=180).contains(&astro.track_interval_minutes) {
            return Err(invalid("astro.track_interval_minutes", "must be 1..=180"));
        }
        for (field, value) in [
            ("astro.refraction_deg", astro.refraction_deg),
            ("astro.sun_semidiameter_deg", astro.sun_semidiameter_deg),
            ("astro.dip_coefficient_deg", astro.dip_coefficient_deg),
        ] {
            if !value.is_finite() || !(0.0..=2.0).contains(&value) {
                return Err(invalid(field, "must be between 0 and 2 degrees"));
            }
        }
        if astro.phase_reference_hour > 23 {
            return Err(invalid("astro.phase_reference_hour", "must be 0..=23"));
        }
        if astro.lunation_icons < 2 {
            return Err(invalid("astro.lunation_icons", "need at least 2 icons"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        field,
        reason: reason.to_string(),
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        stations = config.stations.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), "invalid config file format: {}", e);
                    warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Reject out-of-range engine settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine().validate()
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            tide: self.tide,
            astro: self.astro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tide.step_minutes, 10);
        assert_eq!(config.astro.search_step_minutes, 10);
        assert_eq!(config.astro.phase_reference_hour, 22);
        assert_eq!(config.astro.lunation_icons, 28);
        assert!((config.astro.refraction_deg - 0.5667).abs() < 1e-3);
        assert!(config.stations.is_empty());
        assert!(config.engine().validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.stations.push(StationEntry {
            id: "9413745".into(),
            name: "Santa Cruz, Monterey Bay".into(),
            state: Some("CA".into()),
            latitude: 36.9583,
            longitude: -122.0167,
            elevation: 0.0,
            timezone: "America/Los_Angeles".into(),
        });
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Config = toml::from_str("[astro]\nsearch_step_minutes = 5\n").unwrap();
        assert_eq!(parsed.astro.search_step_minutes, 5);
        assert_eq!(parsed.astro.track_interval_minutes, 60);
        assert_eq!(parsed.tide.step_minutes, 10);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is = = not toml").unwrap();
        assert_eq!(Config::load_from_path(file.path()), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.tide.step_minutes = 5;
        config.save_to_path(file.path()).unwrap();
        assert_eq!(Config::load_from_path(file.path()).tide.step_minutes, 5);
    }

    #[test]
    fn test_search_step_too_coarse_is_rejected() {
        let mut engine = EngineConfig::default();
        engine.astro.search_step_minutes = 45;
        assert!(matches!(
            engine.validate(),
            Err(ConfigError::InvalidSetting {
                field: "astro.search_step_minutes",
                ..
            })
        ));
    }
}
