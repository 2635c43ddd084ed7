//! # Sun * Moon * Tide Entry Point
//!
//! Reads a NOAA annual tide prediction file, looks its station up in the
//! configured station directory and builds a year of calendar days.
//!
//! ```text
//! sun-moon-tide <annual.txt> [--config PATH] [--station ID] [--year YYYY]
//!               [--json PATH] [--stdout] [--day YYYY-MM-DD]
//! ```
//!
//! With no output flag the per-day summary is printed, as with `--stdout`.
//! Logs go to stderr; set `RUST_LOG=debug` for engine progress.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use std::env;
use std::fs;
use std::path::PathBuf;
use sun_moon_tide::config::{Config, DEFAULT_CONFIG_FILE};
use sun_moon_tide::noaa::TideFile;
use sun_moon_tide::report::{day_summary, tide_chart, year_summary};
use sun_moon_tide::station::{StationDirectory, StationLookup};
use sun_moon_tide::{build_calendar, Calendar, StationInfo};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub input: PathBuf,
    pub config: PathBuf,
    pub station: Option<String>,
    pub year: Option<i32>,
    pub json: Option<PathBuf>,
    pub stdout: bool,
    pub day: Option<NaiveDate>,
}

impl CliArgs {
    /// Parse arguments (without the program name).
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut input = None;
        let mut cli = CliArgs {
            input: PathBuf::new(),
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            station: None,
            year: None,
            json: None,
            stdout: false,
            day: None,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} needs a value"))
            };
            match arg.as_str() {
                "--config" => cli.config = PathBuf::from(value("--config")?),
                "--station" => cli.station = Some(value("--station")?),
                "--year" => {
                    let raw = value("--year")?;
                    cli.year = Some(raw.parse().with_context(|| format!("bad year '{raw}'"))?);
                }
                "--json" => cli.json = Some(PathBuf::from(value("--json")?)),
                "--day" => {
                    let raw = value("--day")?;
                    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                        .with_context(|| format!("bad date '{raw}', expected YYYY-MM-DD"))?;
                    cli.day = Some(date);
                }
                "--stdout" => cli.stdout = true,
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                path => {
                    if input.replace(PathBuf::from(path)).is_some() {
                        bail!("only one prediction file may be given");
                    }
                }
            }
        }

        cli.input = input.ok_or_else(|| anyhow!("usage: sun-moon-tide <annual.txt> [options]"))?;
        Ok(cli)
    }
}

/// Resolve the station and year for a prediction file.
pub fn resolve_station(
    file: &TideFile,
    directory: &impl StationLookup,
    station_override: Option<&str>,
    year_override: Option<i32>,
) -> anyhow::Result<StationInfo> {
    let id = station_override
        .or_else(|| file.header.station_id())
        .context("prediction file has no Stationid; pass --station")?;
    let year = year_override
        .or_else(|| file.year())
        .context("cannot tell the prediction year; pass --year")?;
    let station = directory.station_info(id, year)?;

    if let Some(name) = file.header.station_name() {
        if !name.eq_ignore_ascii_case(&station.name) {
            warn!(file = name, directory = %station.name, "station names differ");
        }
    }
    Ok(station)
}

fn build(cli: &CliArgs) -> anyhow::Result<Calendar> {
    let config = Config::load_from_path(&cli.config);
    config.validate().context("invalid settings in config file")?;

    let file = TideFile::from_path(&cli.input)?;
    let directory = StationDirectory::new(config.stations.clone());
    let station = resolve_station(&file, &directory, cli.station.as_deref(), cli.year)?;
    let adapter = station.validate()?;

    info!(
        station = %station.place_name(),
        year = station.year,
        records = file.records.len(),
        datum = file.header.datum().unwrap_or("unknown"),
        units = file.header.units().unwrap_or("unknown"),
        "building calendar"
    );
    if let Some(reference) = file.header.reference_station_id() {
        info!(reference, "subordinate station, predictions are offsets from its reference");
    }
    let extrema = file.extrema(&adapter);
    let calendar = build_calendar(&station, &extrema, &config.engine())?;
    Ok(calendar)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = CliArgs::parse(env::args().skip(1))?;
    let calendar = build(&cli)?;

    if let Some(path) = &cli.json {
        let json = serde_json::to_string_pretty(&calendar)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote calendar JSON");
    }

    if let Some(date) = cli.day {
        let day = calendar
            .day(date)
            .with_context(|| format!("{date} is not in {}", calendar.station.year))?;
        print!("{}", tide_chart(day, calendar.tide_min, calendar.tide_max));
        println!("{}", day_summary(day));
    }

    if cli.stdout || (cli.json.is_none() && cli.day.is_none()) {
        print!("{}", year_summary(&calendar));
    }

    Ok(())
}
