use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WAZE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://www\.waze\.com/ul\?ll=(-?\d+\.\d+),(-?\d+\.\d+)")
        .expect("valid waze link regex")
});

/// One reported position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub latitude: f64,
    pub longitude: f64,
}

/// Extracts the coordinates of the first Waze link in `text`.
#[must_use]
pub fn parse_ping(text: &str) -> Option<Ping> {
    let caps = WAZE_LINK_RE.captures(text)?;
    let latitude = caps.get(1)?.as_str().parse().ok()?;
    let longitude = caps.get(2)?.as_str().parse().ok()?;
    Some(Ping {
        latitude,
        longitude,
    })
}
