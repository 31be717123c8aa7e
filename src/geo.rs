//! Coordinate parsing and magnitude classification.
//!
//! PHIVOLCS reports coordinates either as signed decimals (`"13.80"`) or
//! as a decimal with a compass letter (`"10.50°N"`).

use serde::Serialize;

/// Parse a textual coordinate into signed degrees.
///
/// Returns `0.0` when the text matches neither accepted form, which makes
/// a genuine zero coordinate indistinguishable from a parse failure. Use
/// [`try_parse_coordinate`] when that matters.
#[must_use]
pub fn parse_coordinate(text: &str) -> f64 {
    try_parse_coordinate(text).unwrap_or(0.0)
}

/// Parse a textual coordinate, returning `None` on failure.
#[must_use]
pub fn try_parse_coordinate(text: &str) -> Option<f64> {
    if let Ok(value) = text.trim().parse::<f64>() {
        if value.is_finite() {
            return Some(value);
        }
    }
    parse_compass(text)
}

/// Match `<digits-and-dots>°<N|S|E|W>` anywhere in the text.
fn parse_compass(text: &str) -> Option<f64> {
    for (pos, _) in text.match_indices('°') {
        let head = &text[..pos];
        let start = head
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
            .last()
            .map(|(i, _)| i);
        let Some(start) = start else { continue };

        let tail = &text[pos + '°'.len_utf8()..];
        let sign = match tail.chars().next() {
            Some('N' | 'E') => 1.0,
            Some('S' | 'W') => -1.0,
            _ => continue,
        };

        if let Ok(value) = head[start..].parse::<f64>() {
            return Some(sign * value);
        }
    }
    None
}

/// Three-tier magnitude classification (boundaries at 3 and 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeTier {
    /// Magnitude below 3
    Low,
    /// Magnitude in [3, 5)
    Medium,
    /// Magnitude 5 and above
    High,
}

impl MagnitudeTier {
    #[must_use]
    pub fn of(magnitude: f64) -> Self {
        if magnitude < 3.0 {
            Self::Low
        } else if magnitude < 5.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Color token understood by the dashboard stylesheet.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Low => "hsl(var(--magnitude-low))",
            Self::Medium => "hsl(var(--magnitude-medium))",
            Self::High => "hsl(var(--magnitude-high))",
        }
    }

    /// CSS class for discrete styling.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Low => "magnitude-low",
            Self::Medium => "magnitude-medium",
            Self::High => "magnitude-high",
        }
    }
}

/// Badge style for list rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Destructive,
    Default,
    Secondary,
}

impl BadgeVariant {
    #[must_use]
    pub fn of(magnitude: f64) -> Self {
        match MagnitudeTier::of(magnitude) {
            MagnitudeTier::High => Self::Destructive,
            MagnitudeTier::Medium => Self::Default,
            MagnitudeTier::Low => Self::Secondary,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Destructive => "destructive",
            Self::Default => "default",
            Self::Secondary => "secondary",
        }
    }
}

/// One-decimal magnitude label, e.g. `"4.5"`.
#[must_use]
pub fn magnitude_label(magnitude: f64) -> String {
    format!("{magnitude:.1}")
}
