//! # Text Preview
//!
//! Plain-text views of a [`Calendar`] for checking a build without a
//! renderer: one summary line per day, and an ASCII chart of a single day's
//! tide curve with the day's highs and lows marked.

use crate::{BodyDay, Calendar, DayRecord, ExtremumKind, PhaseKind, Visibility};
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use std::fmt::Write;

/// Chart height in text rows
const ROWS: usize = 16;
/// Space for Y-axis labels
const Y_AXIS_WIDTH: usize = 6;
/// Minutes of curve per chart column
const MINUTES_PER_COLUMN: i64 = 30;

fn hhmm(t: Option<DateTime<Tz>>) -> String {
    t.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

fn rise_set(body: &BodyDay) -> String {
    match body.visibility {
        Visibility::AlwaysAbove => "up all day ".to_string(),
        Visibility::AlwaysBelow => "down all day".to_string(),
        Visibility::RisesAndSets => format!("{}-{}", hhmm(body.rise), hhmm(body.set)),
    }
}

fn phase_label(kind: PhaseKind) -> &'static str {
    match kind {
        PhaseKind::NewMoon => "new moon",
        PhaseKind::FirstQuarter => "first quarter",
        PhaseKind::FullMoon => "full moon",
        PhaseKind::LastQuarter => "last quarter",
    }
}

/// One line per day: sun, moon, tides and any phase or season event.
pub fn day_summary(day: &DayRecord) -> String {
    let astro = &day.astro;
    let mut line = format!(
        "{}  sun {}  moon {}  lit {:>3.0}%  ",
        day.date.format("%Y-%m-%d %a"),
        rise_set(&astro.sun),
        rise_set(&astro.moon),
        astro.moon_illumination * 100.0
    );
    for e in &day.extrema {
        let tag = match e.kind {
            ExtremumKind::High => 'H',
            ExtremumKind::Low => 'L',
        };
        let _ = write!(line, " {tag} {} {:>5.1}", e.timestamp.format("%H:%M"), e.height);
    }
    if let Some(event) = astro.phase_event {
        let _ = write!(
            line,
            "  [{} {}]",
            phase_label(event.kind),
            event.timestamp.format("%H:%M")
        );
    }
    if let Some(season) = astro.season {
        let _ = write!(
            line,
            "  [{} {}]",
            season.kind.label(),
            season.timestamp.format("%H:%M")
        );
    }
    line
}

/// Header plus [`day_summary`] for every day.
pub fn year_summary(calendar: &Calendar) -> String {
    let station = &calendar.station;
    let mut out = format!(
        "{} ({}) {}  lat {:.4} lon {:.4}  {}\n",
        station.place_name(),
        station.id,
        station.year,
        station.latitude,
        station.longitude,
        station.timezone
    );
    let _ = writeln!(
        out,
        "tide range {:.1} .. {:.1}",
        calendar.tide_min, calendar.tide_max
    );
    for day in &calendar.days {
        out.push_str(&day_summary(day));
        out.push('\n');
    }
    out
}

/// ASCII chart of one day's tide curve scaled to `[min, max]`.
///
/// Highs and lows are drawn as `H` and `L` in the column where they fall;
/// the axis below has a tick every three hours.
pub fn tide_chart(day: &DayRecord, min: f64, max: f64) -> String {
    let Some(first) = day.tides.first() else {
        return format!("{}: no tide samples\n", day.date);
    };
    let start = first.timestamp;
    let column_of = |t: DateTime<Tz>| ((t - start).num_minutes() / MINUTES_PER_COLUMN).max(0) as usize;
    let columns = day
        .tides
        .last()
        .map(|s| column_of(s.timestamp) + 1)
        .unwrap_or(1);

    let span = if max > min { max - min } else { 1.0 };
    let tide_to_row = |height: f64| {
        let normalized = ((height - min) / span).clamp(0.0, 1.0);
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; columns + Y_AXIS_WIDTH]; ROWS];

    let tide_step = if span > 4.0 { 1.0 } else { 0.5 };
    let mut label_height = (min / tide_step).ceil() * tide_step;
    while label_height <= max {
        let row = tide_to_row(label_height);
        let label = format!("{:>width$.1}", label_height, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
        grid[row][Y_AXIS_WIDTH - 1] = '│';
        label_height += tide_step;
    }

    for sample in &day.tides {
        let column = column_of(sample.timestamp);
        if column < columns {
            grid[tide_to_row(sample.height)][column + Y_AXIS_WIDTH] = '•';
        }
    }
    for e in &day.extrema {
        let column = column_of(e.timestamp);
        if column < columns {
            grid[tide_to_row(e.height)][column + Y_AXIS_WIDTH] = match e.kind {
                ExtremumKind::High => 'H',
                ExtremumKind::Low => 'L',
            };
        }
    }

    let mut out = format!("{}\n", day.date.format("%A %B %-d, %Y"));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    // Ticks and hour labels every three local hours.
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let mut ticks = vec![' '; columns];
    let mut labels = vec![' '; columns + 2];
    for sample in &day.tides {
        let t = sample.timestamp;
        if t.minute() == 0 && t.hour() % 3 == 0 {
            let column = column_of(t);
            if column < columns {
                ticks[column] = '|';
                for (i, ch) in format!("{:02}", t.hour()).chars().enumerate() {
                    labels[column + i] = ch;
                }
            }
        }
    }
    let _ = writeln!(out, "{padding}{}", ticks.into_iter().collect::<String>().trim_end());
    let _ = writeln!(out, "{padding}{}", labels.into_iter().collect::<String>().trim_end());
    out
}
