//! Scenario tests that run the whole pipeline: prediction file, station
//! directory, both engines and the daily merge.

mod cli_tests;
