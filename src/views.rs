//! Presentation views rendered to HTML fragments.
//!
//! No business logic lives here: every function turns already-derived
//! dashboard data into markup for the browser to swap in.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::dashboard::ListKind;
use crate::geo::{BadgeVariant, MagnitudeTier};
use crate::markers::{
    MapState, MapSynchronizer, MarkerId, MarkerLayer, TILE_ATTRIBUTION, TILE_URL, Viewport,
};
use crate::models::{Earthquake, EarthquakeStats};

/// Characters of the strongest location shown on its card.
const STRONGEST_LOCATION_CHARS: usize = 30;

/// Escape text for interpolation into HTML.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `meta.timestamp` as a local wall-clock time.
///
/// Falls back to the raw text when it is not RFC 3339.
#[must_use]
pub fn format_last_update(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Header with last-update time and the refresh control.
///
/// `error` is the failure of the latest all-earthquakes poll; the shown
/// data is then older than the last attempt.
#[must_use]
pub fn header_html(
    last_update: Option<&str>,
    is_loading: bool,
    filtered: bool,
    error: Option<&str>,
) -> String {
    let updated = last_update
        .map(|ts| {
            format!(
                r#"<span class="last-update">Last update: {}</span>"#,
                escape(&format_last_update(ts))
            )
        })
        .unwrap_or_default();
    let filter_pill = if filtered {
        r#"<span class="status-pill status-filtered">Filtered</span>"#
    } else {
        ""
    };
    let stale_pill = error
        .map(|e| {
            format!(
                r#"<span class="status-pill status-stale" title="{}">Stale</span>"#,
                escape(e)
            )
        })
        .unwrap_or_default();
    let (disabled, spin) = if is_loading {
        (" disabled", " spin")
    } else {
        ("", "")
    };

    format!(
        r#"<div class="header-meta">{updated}{stale_pill}{filter_pill}
  <button class="btn btn-ghost" hx-post="/refresh" hx-swap="none"{disabled}>
    <span class="refresh-icon{spin}">↻</span> Refresh
  </button>
</div>"#
    )
}

/// Emphasis of a stats card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVariant {
    Default,
    Primary,
    Destructive,
}

impl CardVariant {
    const fn css_class(self) -> &'static str {
        match self {
            Self::Default => "card-default",
            Self::Primary => "card-primary",
            Self::Destructive => "card-destructive",
        }
    }
}

/// One summary statistic card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
    pub subtitle: String,
    pub variant: CardVariant,
}

/// The four summary cards. Missing stats render as zeros.
#[must_use]
pub fn stat_cards(stats: Option<&EarthquakeStats>) -> [StatCard; 4] {
    let total = stats.map_or(0, |s| s.total_count);
    let max = stats.map_or(0.0, |s| s.magnitude.max);
    let strongest = stats
        .and_then(|s| s.strongest.as_ref())
        .map(|e| e.location.chars().take(STRONGEST_LOCATION_CHARS).collect::<String>())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| "N/A".to_string());
    let average_mag = stats.map_or_else(|| "0".to_string(), |s| format!("{:.1}", s.magnitude.average));
    let average_depth = stats.map_or_else(|| "0".to_string(), |s| format!("{:.0}", s.depth.average));

    [
        StatCard {
            title: "Total Earthquakes",
            value: total.to_string(),
            subtitle: "In the last 24 hours".to_string(),
            variant: CardVariant::Primary,
        },
        StatCard {
            title: "Strongest",
            value: format!("M {max}"),
            subtitle: strongest,
            variant: CardVariant::Destructive,
        },
        StatCard {
            title: "Average Magnitude",
            value: format!("M {average_mag}"),
            subtitle: "Across all recorded".to_string(),
            variant: CardVariant::Default,
        },
        StatCard {
            title: "Average Depth",
            value: format!("{average_depth} km"),
            subtitle: "Below surface".to_string(),
            variant: CardVariant::Default,
        },
    ]
}

#[must_use]
pub fn stats_html(stats: Option<&EarthquakeStats>) -> String {
    let mut html = String::new();
    for card in stat_cards(stats) {
        let _ = write!(
            html,
            r#"<div class="stat-card {variant}">
  <p class="stat-title">{title}</p>
  <p class="stat-value">{value}</p>
  <p class="stat-subtitle">{subtitle}</p>
</div>
"#,
            variant = card.variant.css_class(),
            title = escape(card.title),
            value = escape(&card.value),
            subtitle = escape(&card.subtitle),
        );
    }
    html
}

/// A titled, clickable list of earthquakes.
#[must_use]
pub fn list_html(title: &str, kind: ListKind, rows: &[Earthquake]) -> String {
    let list = match kind {
        ListKind::Top => "top",
        ListKind::Recent => "recent",
    };

    let mut body = String::new();
    if rows.is_empty() {
        body.push_str(r#"<div class="empty-state"><p class="empty-desc">No earthquakes found</p></div>"#);
    }
    for (index, eq) in rows.iter().enumerate() {
        let _ = write!(
            body,
            r#"<div class="quake-row" id="{list}-{key}" hx-post="/select/{list}/{index}" hx-swap="none">
  <div class="quake-row-head">
    <span class="badge badge-{badge}">M {mag}</span>
    <span class="quake-depth">{depth} deep</span>
  </div>
  <p class="quake-location">{location}</p>
  <div class="quake-row-meta">
    <span>◷ {date} {time}</span>
    <span>⊕ {lat}, {lng}</span>
  </div>
</div>
"#,
            key = escape(&eq.display_key(index)),
            badge = BadgeVariant::of(eq.magnitude_numeric).as_str(),
            mag = eq.magnitude_numeric,
            depth = escape(&eq.depth),
            location = escape(&eq.location),
            date = escape(&eq.date),
            time = escape(&eq.time),
            lat = escape(&eq.latitude),
            lng = escape(&eq.longitude),
        );
    }

    format!(
        r#"<div class="list-panel">
  <div class="list-title">{title}</div>
  <div class="list-body">
{body}  </div>
</div>"#,
        title = escape(title),
    )
}

/// Magnitude scale legend with the number of mapped events.
#[must_use]
pub fn legend_html(count: usize) -> String {
    format!(
        r#"<p class="legend-title">Magnitude Scale</p>
<div class="legend-row"><span class="legend-dot {high}"></span>5.0+ Strong</div>
<div class="legend-row"><span class="legend-dot {medium}"></span>3.0 - 4.9</div>
<div class="legend-row"><span class="legend-dot {low}"></span>&lt; 3.0</div>
<p class="legend-count">{count} events</p>"#,
        high = MagnitudeTier::High.css_class(),
        medium = MagnitudeTier::Medium.css_class(),
        low = MagnitudeTier::Low.css_class(),
    )
}

/// Details of the last clicked earthquake.
#[must_use]
pub fn selected_html(selected: Option<&Earthquake>) -> String {
    let Some(eq) = selected else {
        return r#"<p class="selected-empty">Click a marker or row for details</p>"#.to_string();
    };
    format!(
        r#"<div class="selected-card">
  <span class="badge badge-{badge}">M {mag}</span>
  <p class="quake-location">{location}</p>
  <div class="quake-row-meta">
    <span>◷ {date} {time}</span>
    <span>↓ {depth}</span>
    <span>⊕ {lat}, {lng}</span>
  </div>
</div>"#,
        badge = BadgeVariant::of(eq.magnitude_numeric).as_str(),
        mag = eq.magnitude_numeric,
        location = escape(&eq.location),
        date = escape(&eq.date),
        time = escape(&eq.time),
        depth = escape(&eq.depth),
        lat = escape(&eq.latitude),
        lng = escape(&eq.longitude),
    )
}

/// Popup bound to a marker.
#[must_use]
pub fn popup_html(eq: &Earthquake) -> String {
    format!(
        r#"<div class="eq-popup">
  <div class="eq-popup-head">
    <span class="eq-popup-mag" style="background: {color}">M {mag}</span>
    <span class="eq-popup-depth">{depth} km deep</span>
  </div>
  <p class="eq-popup-location">{location}</p>
  <p class="eq-popup-time">{date} at {time}</p>
</div>"#,
        color = MagnitudeTier::of(eq.magnitude_numeric).color(),
        mag = eq.magnitude_numeric,
        depth = escape(&eq.depth),
        location = escape(&eq.location),
        date = escape(&eq.date),
        time = escape(&eq.time),
    )
}

/// One marker as the browser draws it.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerView {
    pub id: MarkerId,
    pub lat: f64,
    pub lng: f64,
    pub size: f64,
    pub color: &'static str,
    pub delay: f64,
    pub label: String,
    pub popup: String,
}

/// What the browser needs to mirror the map surface.
#[derive(Debug, Clone, Serialize)]
pub struct MapPayload {
    pub state: MapState,
    /// Bumped on every remount; the browser rebuilds its map when it changes
    pub generation: u64,
    pub viewport: Option<Viewport>,
    pub tile_url: &'static str,
    pub attribution: &'static str,
    pub markers: Vec<MarkerView>,
}

#[must_use]
pub fn map_payload(map: &MapSynchronizer<MarkerLayer>) -> MapPayload {
    let markers = map
        .markers()
        .iter()
        .map(|(id, marker)| MarkerView {
            id: *id,
            lat: marker.lat,
            lng: marker.lng,
            size: marker.size_px,
            color: marker.tier.color(),
            delay: marker.pulse_delay_secs,
            label: marker.label(),
            popup: popup_html(&marker.earthquake),
        })
        .collect();

    MapPayload {
        state: map.state(),
        generation: map.surface().generation(),
        viewport: map.surface().viewport(),
        tile_url: TILE_URL,
        attribution: TILE_ATTRIBUTION,
        markers,
    }
}
