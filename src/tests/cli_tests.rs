//! Command line parsing and station resolution.

use super::calendar_tests::{santa_cruz, synthetic_prediction_file};
use crate::{resolve_station, CliArgs};
use chrono::NaiveDate;
use std::io::Write;
use std::path::PathBuf;
use sun_moon_tide::config::{Config, DEFAULT_CONFIG_FILE};
use sun_moon_tide::noaa::TideFile;
use sun_moon_tide::station::StationDirectory;
use tempfile::NamedTempFile;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parses_all_options() {
    let cli = CliArgs::parse(args(&[
        "annual.txt",
        "--config",
        "my.toml",
        "--json",
        "out.json",
        "--stdout",
        "--day",
        "2016-07-04",
        "--station",
        "9413745",
        "--year",
        "2016",
    ]))
    .unwrap();
    assert_eq!(cli.input, PathBuf::from("annual.txt"));
    assert_eq!(cli.config, PathBuf::from("my.toml"));
    assert_eq!(cli.json, Some(PathBuf::from("out.json")));
    assert!(cli.stdout);
    assert_eq!(cli.day, NaiveDate::from_ymd_opt(2016, 7, 4));
    assert_eq!(cli.station.as_deref(), Some("9413745"));
    assert_eq!(cli.year, Some(2016));
}

#[test]
fn defaults_and_errors() {
    let cli = CliArgs::parse(args(&["annual.txt"])).unwrap();
    assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    assert!(!cli.stdout);

    assert!(CliArgs::parse(args(&[])).is_err());
    assert!(CliArgs::parse(args(&["a.txt", "b.txt"])).is_err());
    assert!(CliArgs::parse(args(&["a.txt", "--day", "July 4"])).is_err());
    assert!(CliArgs::parse(args(&["a.txt", "--json"])).is_err());
    assert!(CliArgs::parse(args(&["a.txt", "--verbose"])).is_err());
}

#[test]
fn station_comes_from_config_file_directory() {
    let mut config = Config::default();
    config.stations.push(santa_cruz());
    let config_file = NamedTempFile::new().unwrap();
    config.save_to_path(config_file.path()).unwrap();

    let mut predictions = NamedTempFile::new().unwrap();
    predictions
        .write_all(synthetic_prediction_file().as_bytes())
        .unwrap();

    let loaded = Config::load_from_path(config_file.path());
    let file = TideFile::from_path(predictions.path()).unwrap();
    let directory = StationDirectory::new(loaded.stations);

    let station = resolve_station(&file, &directory, None, None).unwrap();
    assert_eq!(station.year, 2016);
    assert_eq!(station.timezone, "America/Los_Angeles");

    let overridden = resolve_station(&file, &directory, Some("9413745"), Some(2017)).unwrap();
    assert_eq!(overridden.year, 2017);
    assert!(resolve_station(&file, &directory, Some("1234567"), None).is_err());
}
