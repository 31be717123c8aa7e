//! Map synchronization: markers for the current earthquake set.
//!
//! The synchronizer owns every marker on the map surface. Any change to
//! the earthquake set tears all markers down and rebuilds them from
//! scratch, so the map is always exactly the image of the current set.
//! Going offline destroys the surface itself; coming back online mounts
//! a fresh one at the default viewport.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::geo::{MagnitudeTier, magnitude_label, parse_coordinate};
use crate::models::Earthquake;

/// Smallest marker diameter in pixels.
pub const MIN_MARKER_SIZE_PX: f64 = 36.0;

/// Pixels of marker diameter per unit of magnitude.
pub const PX_PER_MAGNITUDE: f64 = 10.0;

/// Pulse animation offset between consecutive markers, in seconds.
pub const PULSE_STAGGER_SECS: f64 = 0.15;

/// Dark basemap tiles.
pub const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png";

/// Attribution required by the tile provider.
pub const TILE_ATTRIBUTION: &str = r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> &copy; <a href="https://carto.com/">CARTO</a>"#;

/// Map center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub lat: f64,
    pub lng: f64,
    pub zoom: u8,
}

/// The Philippines, where every fresh surface starts.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    lat: 12.0,
    lng: 122.0,
    zoom: 6,
};

/// Identifier of a marker on a surface. Never reused.
pub type MarkerId = u64;

/// A visual marker for one earthquake.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    /// Diameter in pixels
    pub size_px: f64,
    pub tier: MagnitudeTier,
    /// Pulse animation delay in seconds
    pub pulse_delay_secs: f64,
    /// The earthquake emitted when this marker is clicked
    pub earthquake: Earthquake,
}

impl Marker {
    /// Build the marker for the earthquake at `index` in the current set.
    ///
    /// Returns `None` when both coordinates parse to exactly zero, the
    /// sentinel for "unplottable".
    #[must_use]
    pub fn build(index: usize, earthquake: &Earthquake) -> Option<Self> {
        let lat = parse_coordinate(&earthquake.latitude);
        let lng = parse_coordinate(&earthquake.longitude);
        if lat == 0.0 && lng == 0.0 {
            return None;
        }

        let magnitude = earthquake.magnitude_numeric;
        #[allow(clippy::cast_precision_loss)]
        let pulse_delay_secs = index as f64 * PULSE_STAGGER_SECS;

        Some(Self {
            lat,
            lng,
            size_px: marker_size(magnitude),
            tier: MagnitudeTier::of(magnitude),
            pulse_delay_secs,
            earthquake: earthquake.clone(),
        })
    }

    /// Text drawn inside the marker dot.
    #[must_use]
    pub fn label(&self) -> String {
        magnitude_label(self.earthquake.magnitude_numeric)
    }
}

/// Marker diameter for a magnitude.
#[must_use]
pub fn marker_size(magnitude: f64) -> f64 {
    (magnitude * PX_PER_MAGNITUDE).max(MIN_MARKER_SIZE_PX)
}

/// A map that can be mounted, torn down, and carry markers.
pub trait MapSurface {
    /// Create the map with its tile layer at `viewport`.
    fn mount(&mut self, viewport: Viewport);

    /// Destroy the map, including every marker on it.
    fn tear_down(&mut self);

    /// Place a marker and return its id.
    fn add_marker(&mut self, marker: &Marker) -> MarkerId;

    /// Remove a marker previously placed.
    fn remove_marker(&mut self, id: MarkerId);
}

/// Connectivity state of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapState {
    /// Surface mounted, tiles attached
    Online,
    /// Surface destroyed, placeholder shown
    Offline,
}

/// Keeps the markers on a [`MapSurface`] in step with the earthquake set.
#[derive(Debug)]
pub struct MapSynchronizer<S> {
    surface: S,
    state: MapState,
    earthquakes: Vec<Earthquake>,
    markers: Vec<(MarkerId, Marker)>,
}

impl<S: MapSurface> MapSynchronizer<S> {
    /// Wrap a surface, mounting it if `online`.
    pub fn new(mut surface: S, online: bool) -> Self {
        let state = if online {
            surface.mount(DEFAULT_VIEWPORT);
            MapState::Online
        } else {
            MapState::Offline
        };
        Self {
            surface,
            state,
            earthquakes: Vec::new(),
            markers: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> MapState {
        self.state
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Markers currently on the surface, in set order.
    #[must_use]
    pub fn markers(&self) -> &[(MarkerId, Marker)] {
        &self.markers
    }

    /// Resolve a clicked marker to its earthquake.
    #[must_use]
    pub fn earthquake_for(&self, id: MarkerId) -> Option<&Earthquake> {
        self.markers
            .iter()
            .find(|(marker_id, _)| *marker_id == id)
            .map(|(_, marker)| &marker.earthquake)
    }

    /// Handle a connectivity change.
    pub fn set_online(&mut self, online: bool) {
        match (self.state, online) {
            (MapState::Online, false) => {
                info!("map offline, tearing down surface");
                self.markers.clear();
                self.surface.tear_down();
                self.state = MapState::Offline;
            }
            (MapState::Offline, true) => {
                info!("map online, mounting fresh surface");
                self.surface.mount(DEFAULT_VIEWPORT);
                self.state = MapState::Online;
                self.rebuild();
            }
            _ => {}
        }
    }

    /// Replace the earthquake set and reconcile markers.
    ///
    /// Skips the rebuild when the set is unchanged.
    pub fn sync(&mut self, earthquakes: &[Earthquake]) {
        if self.earthquakes == earthquakes {
            return;
        }
        self.earthquakes = earthquakes.to_vec();
        self.rebuild();
    }

    /// Remove every marker, then build one per plottable earthquake.
    fn rebuild(&mut self) {
        for (id, _) in self.markers.drain(..) {
            self.surface.remove_marker(id);
        }
        if self.state == MapState::Offline {
            return;
        }

        for (index, earthquake) in self.earthquakes.iter().enumerate() {
            let Some(marker) = Marker::build(index, earthquake) else {
                continue;
            };
            let id = self.surface.add_marker(&marker);
            self.markers.push((id, marker));
        }

        debug!(
            "reconciled {} markers from {} earthquakes",
            self.markers.len(),
            self.earthquakes.len()
        );
    }
}

/// In-memory surface mirrored to the browser's Leaflet map.
///
/// Each mount bumps `generation` so the browser knows to rebuild its map
/// from scratch rather than reuse the old one.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    viewport: Option<Viewport>,
    generation: u64,
    next_id: MarkerId,
    markers: BTreeMap<MarkerId, Marker>,
}

impl MarkerLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewport of the mounted map, `None` when torn down.
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Markers on the surface, keyed by id.
    #[cfg(test)]
    pub fn markers(&self) -> &BTreeMap<MarkerId, Marker> {
        &self.markers
    }
}

impl MapSurface for MarkerLayer {
    fn mount(&mut self, viewport: Viewport) {
        self.generation += 1;
        self.viewport = Some(viewport);
        self.markers.clear();
    }

    fn tear_down(&mut self) {
        self.viewport = None;
        self.markers.clear();
    }

    fn add_marker(&mut self, marker: &Marker) -> MarkerId {
        let id = self.next_id;
        self.next_id += 1;
        self.markers.insert(id, marker.clone());
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }
}
