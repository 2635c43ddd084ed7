//! # Station Metadata
//!
//! [`StationInfo`] is the read-only description of where and for which year a
//! calendar is built. Metadata comes from an injected [`StationLookup`]
//! (normally a [`StationDirectory`] built from the `[[stations]]` table of
//! the config file) rather than from any global table.

use crate::error::ConfigError;
use crate::timezone::TimeZoneAdapter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the station directory.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StationEntry {
    /// NOAA station id (e.g. "9413745")
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    /// Decimal degrees, north positive
    pub latitude: f64,
    /// Decimal degrees, east positive
    pub longitude: f64,
    /// Meters above sea level
    #[serde(default)]
    pub elevation: f64,
    /// IANA zone name
    pub timezone: String,
}

/// Where and when a calendar is for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationInfo {
    pub id: String,
    pub name: String,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub timezone: String,
    pub year: i32,
}

impl StationInfo {
    pub fn from_entry(entry: &StationEntry, year: i32) -> Self {
        StationInfo {
            id: entry.id.clone(),
            name: entry.name.clone(),
            state: entry.state.clone(),
            latitude: entry.latitude,
            longitude: entry.longitude,
            elevation: entry.elevation,
            timezone: entry.timezone.clone(),
            year,
        }
    }

    /// Check every field the engines rely on and return the zone adapter.
    pub fn validate(&self) -> Result<TimeZoneAdapter, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name"));
        }
        if self.timezone.trim().is_empty() {
            return Err(ConfigError::MissingField("timezone"));
        }
        validate_coordinates(self.latitude, self.longitude)?;
        if !self.elevation.is_finite() || self.elevation < -500.0 {
            return Err(ConfigError::InvalidElevation(self.elevation));
        }
        if !(1..=9999).contains(&self.year) {
            return Err(ConfigError::InvalidSetting {
                field: "year",
                reason: format!("{} is not a four-digit year", self.year),
            });
        }
        TimeZoneAdapter::new(&self.timezone)
    }

    /// "Name, ST" when a state is known.
    pub fn place_name(&self) -> String {
        match &self.state {
            Some(state) if !state.is_empty() => format!("{}, {}", self.name, state),
            _ => self.name.clone(),
        }
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ConfigError> {
    if !latitude.is_finite() || latitude.abs() > 90.0 {
        return Err(ConfigError::InvalidLatitude(latitude));
    }
    if !longitude.is_finite() || longitude.abs() > 180.0 {
        return Err(ConfigError::InvalidLongitude(longitude));
    }
    Ok(())
}

/// Read-only source of station metadata.
pub trait StationLookup {
    fn lookup(&self, id: &str) -> Option<&StationEntry>;

    /// Resolve an id into a full [`StationInfo`] for `year`.
    fn station_info(&self, id: &str, year: i32) -> Result<StationInfo, ConfigError> {
        self.lookup(id)
            .map(|entry| StationInfo::from_entry(entry, year))
            .ok_or_else(|| ConfigError::UnknownStation(id.to_string()))
    }
}

/// In-memory station table keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    entries: HashMap<String, StationEntry>,
}

impl StationDirectory {
    pub fn new(entries: impl IntoIterator<Item = StationEntry>) -> Self {
        StationDirectory {
            entries: entries
                .into_iter()
                .map(|e| (e.id.trim().to_string(), e))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StationLookup for StationDirectory {
    fn lookup(&self, id: &str) -> Option<&StationEntry> {
        self.entries.get(id.trim())
    }
}
