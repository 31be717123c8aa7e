//! Filter criteria and the filter override session.
//!
//! Filtering happens server-side; the session only holds the last
//! successful result set, which supersedes the polled list until cleared.

use tracing::{debug, info, warn};

use crate::client::EarthquakeSource;
use crate::errors::QuakeError;
use crate::models::{ApiResponse, Earthquake};

/// Lower end of the filter panel's magnitude slider.
pub const SLIDER_MIN: f64 = 0.0;

/// Upper end of the filter panel's magnitude slider.
pub const SLIDER_MAX: f64 = 10.0;

/// Criteria for `/earthquakes/filter`. `None` means "not sent".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterCriteria {
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    pub location: Option<String>,
}

impl FilterCriteria {
    /// Build criteria from the filter panel's widgets.
    ///
    /// A slider bound resting at its extreme means "no bound", and a blank
    /// location means "any location".
    #[must_use]
    pub fn from_panel(low: f64, high: f64, location: &str) -> Self {
        let location = location.trim();
        Self {
            min_magnitude: (low > SLIDER_MIN).then_some(low),
            max_magnitude: (high < SLIDER_MAX).then_some(high),
            location: (!location.is_empty()).then(|| location.to_string()),
        }
    }

    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_magnitude.is_none() && self.max_magnitude.is_none() && self.location.is_none()
    }

    /// Client-side mirror of the server's matching rule, used by stubs.
    #[cfg(test)]
    pub fn matches(&self, quake: &Earthquake) -> bool {
        let mag = quake.magnitude_numeric;
        self.min_magnitude.is_none_or(|min| mag >= min)
            && self.max_magnitude.is_none_or(|max| mag <= max)
            && self.location.as_ref().is_none_or(|needle| {
                quake
                    .location
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

/// Identifies one filter submission. Only the newest one may land.
pub type FilterTicket = u64;

/// Holds the optional override set produced by a filter submission.
#[derive(Debug, Default, Clone)]
pub struct FilterSession {
    overlay: Option<Vec<Earthquake>>,
    issued: FilterTicket,
}

impl FilterSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue one filtered-list request and apply its result.
    ///
    /// # Errors
    ///
    /// Returns the transport failure; any existing override is kept.
    pub async fn submit(
        &mut self,
        source: &dyn EarthquakeSource,
        criteria: &FilterCriteria,
    ) -> Result<usize, QuakeError> {
        let result = source.filter(criteria).await;
        self.accept(result)
    }

    /// Start a submission whose response will arrive later.
    ///
    /// Any submission still in flight is superseded.
    pub fn begin(&mut self) -> FilterTicket {
        self.issued += 1;
        self.issued
    }

    /// Apply the response to the submission identified by `ticket`.
    ///
    /// Returns `None` without touching the override when a newer submission
    /// or a clear happened after `ticket` was issued.
    pub fn apply(
        &mut self,
        ticket: FilterTicket,
        result: Result<ApiResponse<Vec<Earthquake>>, QuakeError>,
    ) -> Option<Result<usize, QuakeError>> {
        if ticket != self.issued {
            debug!("dropping superseded filter response {} (latest {})", ticket, self.issued);
            return None;
        }
        Some(self.accept(result))
    }

    /// On success the override is replaced and the number of matches is
    /// returned. On failure the current override is left untouched.
    fn accept(
        &mut self,
        result: Result<ApiResponse<Vec<Earthquake>>, QuakeError>,
    ) -> Result<usize, QuakeError> {
        match result {
            Ok(response) => {
                let found = response.data.len();
                info!("filter override set ({} earthquakes)", found);
                self.overlay = Some(response.data);
                Ok(found)
            }
            Err(e) => {
                warn!("filter request failed: {}", e);
                Err(e)
            }
        }
    }

    /// Drop the override, reverting to the polled list.
    ///
    /// Submissions still in flight are superseded.
    pub fn clear(&mut self) {
        self.issued += 1;
        if self.overlay.take().is_some() {
            info!("filter override cleared");
        }
    }

    /// The override set, if one is active.
    #[must_use]
    pub fn active(&self) -> Option<&[Earthquake]> {
        self.overlay.as_deref()
    }
}
