use std::collections::VecDeque;

use serde::Serialize;
use serde_json::{json, Value};

use crate::parse::Ping;

/// Above this many pings the layer renders as a heatmap.
pub const MARKER_LIMIT: usize = 5;

/// Retention used by [`PingLayer::new`].
pub const DEFAULT_MAX_RETAINED: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Markers,
    Heatmap,
}

/// Accumulated pings for the map overlay, oldest first.
///
/// Holds at most `max_retained` pings; pushing past that drops the oldest.
#[derive(Debug, Clone)]
pub struct PingLayer {
    pings: VecDeque<Ping>,
    max_retained: usize,
}

impl Default for PingLayer {
    fn default() -> Self {
        Self::with_max_retained(DEFAULT_MAX_RETAINED)
    }
}

/// Serializable view of the layer for API clients.
#[derive(Debug, Clone, Serialize)]
pub struct PingView {
    pub mode: DisplayMode,
    pub count: usize,
    pub geojson: Value,
}

impl PingLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer that keeps the newest `max_retained` pings (at least one).
    #[must_use]
    pub fn with_max_retained(max_retained: usize) -> Self {
        let max_retained = max_retained.max(1);
        Self {
            pings: VecDeque::new(),
            max_retained,
        }
    }

    /// Adds a ping and returns the resulting display mode.
    pub fn push(&mut self, ping: Ping) -> DisplayMode {
        if self.pings.len() == self.max_retained {
            self.pings.pop_front();
        }
        self.pings.push_back(ping);
        let mode = self.mode();
        tracing::debug!(count = self.pings.len(), ?mode, "ping layer updated");
        mode
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        if self.pings.len() <= MARKER_LIMIT {
            DisplayMode::Markers
        } else {
            DisplayMode::Heatmap
        }
    }

    pub fn pings(&self) -> impl ExactSizeIterator<Item = &Ping> {
        self.pings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pings.is_empty()
    }

    /// GeoJSON `FeatureCollection` of point features (`[longitude, latitude]`).
    #[must_use]
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .pings
            .iter()
            .map(|ping| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [ping.longitude, ping.latitude],
                    },
                    "properties": {},
                })
            })
            .collect();
        json!({ "type": "FeatureCollection", "features": features })
    }

    #[must_use]
    pub fn view(&self) -> PingView {
        PingView {
            mode: self.mode(),
            count: self.pings.len(),
            geojson: self.to_geojson(),
        }
    }
}
