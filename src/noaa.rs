//! # NOAA Annual Tide Prediction Files
//!
//! Reads the plain-text "Annual Tide Prediction" export from NOAA Tides and
//! Currents (High/Low interval). A file looks like:
//!
//! ```text
//! NOAA/NOS/CO-OPS
//! Disclaimer: These data are based upon the latest information available ...
//! Annual Tide Prediction
//! StationName: SANTA CRUZ, MONTEREY BAY
//! State: CA
//! Stationid: 9413745
//! From: 20160101 00:00 - 20161231 23:59
//! Time Zone: LST_LDT
//! Datum: MLLW
//! Units: Feet and Centimeters
//!
//! Date 		Day	Time		Pred(Ft)	Pred(cm)	High/Low
//! 2016/01/01	Fri	04:58 AM	5.6	171	H
//! 2016/01/01	Fri	11:46 AM	2.0	61	L
//! ```
//!
//! Times are wall-clock times at the station (`LST_LDT`) unless the header
//! says `GMT`. Parsing keeps them naive; [`TideFile::extrema`] attaches the
//! zone through the [`TimeZoneAdapter`], which owns the DST policy.

use crate::error::DataError;
use crate::timezone::{Fold, LocalResolution, TimeZoneAdapter};
use crate::{ExtremumKind, TideExtremum};
use anyhow::Context;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Header `Key: Value` pairs, keys as written in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoaaHeader {
    pub fields: BTreeMap<String, String>,
}

impl NoaaHeader {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn station_id(&self) -> Option<&str> {
        self.get("Stationid")
    }

    pub fn station_name(&self) -> Option<&str> {
        self.get("StationName")
    }

    pub fn state(&self) -> Option<&str> {
        self.get("State")
    }

    pub fn datum(&self) -> Option<&str> {
        self.get("Datum")
    }

    pub fn units(&self) -> Option<&str> {
        self.get("Units")
    }

    /// First year of the `From:` range, e.g. `20160101 00:00 - ...`.
    pub fn from_year(&self) -> Option<i32> {
        self.get("From")?.get(..4)?.parse().ok()
    }

    /// True when predictions are published in GMT rather than station time.
    pub fn is_gmt(&self) -> bool {
        self.get("Time Zone")
            .map(|tz| {
                let tz = tz.to_ascii_uppercase();
                tz.starts_with("GMT") || tz.starts_with("UTC")
            })
            .unwrap_or(false)
    }

    /// Subordinate stations are predicted from a reference station plus offsets.
    pub fn reference_station_id(&self) -> Option<&str> {
        self.get("ReferenceToStationId")
            .or_else(|| self.get("ReferencedToStationId"))
    }
}

/// One row of the prediction table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TideRecord {
    /// One-based line number in the source
    pub line: usize,
    pub local: NaiveDateTime,
    pub height_ft: f64,
    pub height_cm: f64,
    pub kind: ExtremumKind,
}

/// A parsed annual prediction file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TideFile {
    pub header: NoaaHeader,
    pub records: Vec<TideRecord>,
}

impl TideFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading tide predictions from {}", path.display()))?;
        let file = Self::parse(&text)
            .with_context(|| format!("parsing tide predictions in {}", path.display()))?;
        Ok(file)
    }

    pub fn parse(text: &str) -> Result<Self, DataError> {
        let mut header = NoaaHeader::default();
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
        let mut saw_columns = false;

        for (_, line) in lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.starts_with("Date") {
                saw_columns = true;
                break;
            }
            if let Some((key, value)) = trimmed.split_once(':') {
                header
                    .fields
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        if !saw_columns {
            return Err(DataError::Parse {
                line: text.lines().count(),
                reason: "no 'Date Day Time ...' column header found".into(),
            });
        }

        let mut records = Vec::new();
        for (line_no, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            records.push(parse_row(line_no, line)?);
        }
        debug!(
            station = header.station_id().unwrap_or("?"),
            records = records.len(),
            "parsed NOAA prediction file"
        );
        Ok(TideFile { header, records })
    }

    /// Calendar year of the predictions.
    pub fn year(&self) -> Option<i32> {
        self.header
            .from_year()
            .or_else(|| self.records.first().map(|r| r.local.year()))
    }

    /// Attach the station zone to every record.
    ///
    /// Wall-clock times in a DST fold take the earlier instant unless that
    /// would put the record at or before its predecessor.
    pub fn extrema(&self, adapter: &TimeZoneAdapter) -> Vec<TideExtremum> {
        let mut out: Vec<TideExtremum> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let timestamp = if self.header.is_gmt() {
                adapter.to_local(Utc.from_utc_datetime(&record.local))
            } else {
                let fold = match (adapter.resolve(record.local), out.last()) {
                    (LocalResolution::Fold { earlier, .. }, Some(prev))
                        if prev.timestamp >= earlier =>
                    {
                        Fold::Later
                    }
                    _ => Fold::Earlier,
                };
                adapter.localize(record.local, fold)
            };
            out.push(TideExtremum {
                timestamp,
                height: record.height_ft,
                kind: record.kind,
            });
        }
        out
    }
}

fn parse_row(line_no: usize, line: &str) -> Result<TideRecord, DataError> {
    let err = |reason: String| DataError::Parse {
        line: line_no,
        reason,
    };
    let cols: Vec<&str> = line.split_whitespace().collect();
    let [date, _day, time, meridiem, ft, cm, kind] = cols[..] else {
        return Err(err(format!("expected 7 columns, found {}", cols.len())));
    };

    let date = NaiveDate::parse_from_str(date, "%Y/%m/%d")
        .map_err(|e| err(format!("bad date '{date}': {e}")))?;
    let time = NaiveTime::parse_from_str(&format!("{time} {meridiem}"), "%I:%M %p")
        .map_err(|e| err(format!("bad time '{time} {meridiem}': {e}")))?;
    let height_ft: f64 = ft
        .parse()
        .map_err(|_| err(format!("bad height '{ft}'")))?;
    let height_cm: f64 = cm
        .parse()
        .map_err(|_| err(format!("bad height '{cm}'")))?;
    let kind = match kind {
        "H" => ExtremumKind::High,
        "L" => ExtremumKind::Low,
        other => return Err(err(format!("expected H or L, found '{other}'"))),
    };

    Ok(TideRecord {
        line: line_no,
        local: date.and_time(time),
        height_ft,
        height_cm,
        kind,
    })
}
