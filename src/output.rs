//! Output formatters for earthquakes and statistics.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use serde::Serialize;

use crate::geo::{BadgeVariant, MagnitudeTier, magnitude_label};
use crate::models::{Earthquake, EarthquakeStats};
use crate::views::{CardVariant, stat_cards};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Magnitude tier colors, matching the map palette
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const GREEN: &str = "\x1b[92m";
const CYAN: &str = "\x1b[96m";

const ICON_QUAKE: &str = "🌍";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

fn tier_color(tier: MagnitudeTier) -> &'static str {
    match tier {
        MagnitudeTier::High => RED,
        MagnitudeTier::Medium => YELLOW,
        MagnitudeTier::Low => GREEN,
    }
}

fn tier_label(tier: MagnitudeTier) -> &'static str {
    match tier {
        MagnitudeTier::High => "STRONG",
        MagnitudeTier::Medium => "MODERATE",
        MagnitudeTier::Low => "LIGHT",
    }
}

/// Write earthquakes in human-readable format, color-coded by tier.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, earthquakes: &[Earthquake]) -> io::Result<()> {
    if earthquakes.is_empty() {
        return writeln!(writer, "{DIM}No earthquakes found{RESET}");
    }

    for eq in earthquakes {
        let tier = MagnitudeTier::of(eq.magnitude_numeric);
        let color = tier_color(tier);
        let label = tier_label(tier);
        let mag = magnitude_label(eq.magnitude_numeric);
        let emphasis = match BadgeVariant::of(eq.magnitude_numeric) {
            BadgeVariant::Destructive => BOLD,
            BadgeVariant::Default | BadgeVariant::Secondary => "",
        };

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{emphasis}M{mag}{RESET} │ \
             {color}{label:8}{RESET} │ \
             {DIM}{depth:>8}{RESET} │ \
             {date} {time} │ \
             {location} {DIM}({lat}, {lng}){RESET}",
            depth = eq.depth,
            date = eq.date,
            time = eq.time,
            location = eq.location,
            lat = eq.latitude,
            lng = eq.longitude,
        )?;
    }
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> io::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Write earthquakes as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, earthquakes: &[Earthquake]) -> io::Result<()> {
    writeln!(writer, "{}", to_json(earthquakes, true)?)
}

/// Write earthquakes as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, earthquakes: &[Earthquake]) -> io::Result<()> {
    for eq in earthquakes {
        writeln!(writer, "{}", to_json(eq, false)?)?;
    }
    Ok(())
}

/// Write earthquakes in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_earthquakes<W: Write>(
    writer: &mut W,
    earthquakes: &[Earthquake],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, earthquakes),
        Format::Json => write_json(writer, earthquakes),
        Format::Ndjson => write_ndjson(writer, earthquakes),
    }
}

/// Write statistics: the four dashboard cards for humans, the raw object
/// otherwise.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_stats<W: Write>(writer: &mut W, stats: &EarthquakeStats, format: Format) -> io::Result<()> {
    match format {
        Format::Human => {
            for card in stat_cards(Some(stats)) {
                let color = match card.variant {
                    CardVariant::Primary => CYAN,
                    CardVariant::Destructive => RED,
                    CardVariant::Default => "",
                };
                writeln!(
                    writer,
                    "{BOLD}{title:<18}{RESET} {color}{value:>10}{RESET}  {DIM}{subtitle}{RESET}",
                    title = card.title,
                    value = card.value,
                    subtitle = card.subtitle,
                )?;
            }
            Ok(())
        }
        Format::Json => writeln!(writer, "{}", to_json(stats, true)?),
        Format::Ndjson => writeln!(writer, "{}", to_json(stats, false)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{quake, stats};

    fn render(earthquakes: &[Earthquake], format: Format) -> String {
        let mut buf = Vec::new();
        write_earthquakes(&mut buf, earthquakes, format).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_human_colors_by_tier() {
        let out = render(
            &[quake("13.80", "120.25", 2.4), quake("9.10", "126.30", 6.3)],
            Format::Human,
        );
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(GREEN) && lines[0].contains("M2.4") && lines[0].contains("LIGHT"));
        assert!(lines[1].contains(RED) && lines[1].contains("STRONG"));
        assert!(lines[1].contains("Calatagan (Batangas)"));
    }

    #[test]
    fn test_human_empty() {
        assert!(render(&[], Format::Human).contains("No earthquakes found"));
    }

    #[test]
    fn test_json_uses_api_field_names() {
        let out = render(&[quake("13.80", "120.25", 4.5)], Format::Json);
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");

        assert_eq!(value[0]["magnitudeNumeric"], 4.5);
        assert_eq!(value[0]["latitude"], "13.80");
    }

    #[test]
    fn test_ndjson_one_line_each() {
        let out = render(
            &[quake("13.80", "120.25", 2.4), quake("9.10", "126.30", 6.3)],
            Format::Ndjson,
        );
        assert_eq!(out.lines().count(), 2);
        for line in out.lines() {
            serde_json::from_str::<Earthquake>(line).expect("earthquake line");
        }
    }

    #[test]
    fn test_stats_human_cards() {
        let response = stats("t", 500);
        let mut buf = Vec::new();
        write_stats(&mut buf, &response.data, Format::Human).expect("write");
        let out = String::from_utf8(buf).expect("utf8");

        assert_eq!(out.lines().count(), 4);
        assert!(out.contains("Total Earthquakes"));
        assert!(out.contains("M 5.6"));
        assert!(out.contains("18 km"));
    }
}
