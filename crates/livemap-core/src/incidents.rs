//! Incident records and their persisted store projection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder written wherever a coordinate is absent or unparseable.
pub const NOT_AVAILABLE: &str = "N/A";

/// A latitude or longitude as supplied by the feed.
///
/// The feed text is kept verbatim when it parses as a finite number so that
/// stored values match the upstream representation exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Coordinate {
    Known(String),
    #[default]
    NotAvailable,
}

impl Coordinate {
    /// Interprets raw coordinate text. Blank, `"N/A"`, and non-numeric
    /// values all collapse to [`Coordinate::NotAvailable`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
            return Self::NotAvailable;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Known(trimmed.to_string()),
            _ => Self::NotAvailable,
        }
    }

    #[must_use]
    pub fn from_number(value: f64) -> Self {
        if value.is_finite() {
            Self::Known(value.to_string())
        } else {
            Self::NotAvailable
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(text) => text,
            Self::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self::parse(&text),
            Raw::Number(value) => Self::from_number(value),
        })
    }
}

/// One incident extracted from a feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// CAD-ID parsed from the title. Empty when the title did not match.
    pub case_id: String,
    pub title: String,
    pub incident_type: String,
    pub suburb: String,
    pub local_council: String,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    pub published_at: Option<DateTime<Utc>>,
    /// `"<time>, <date>"` rendered in AWST.
    pub time_reported: String,
}

impl IncidentRecord {
    /// Whether the record carries a usable store key.
    #[must_use]
    pub fn is_keyed(&self) -> bool {
        !self.case_id.is_empty()
    }

    /// Whether both coordinates are present, i.e. the record can be rendered.
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_available() && self.longitude.is_available()
    }

    /// Projects the record onto the fields persisted in the store.
    #[must_use]
    pub fn to_store_entry(&self) -> StoreEntry {
        StoreEntry {
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            title: self.title.clone(),
            suburb: self.suburb.clone(),
            local_council: self.local_council.clone(),
            time_reported: self.time_reported.clone(),
        }
    }
}

/// The value stored under a CAD-ID key. Always written whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
    #[serde(default)]
    pub latitude: Coordinate,
    #[serde(default)]
    pub longitude: Coordinate,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub local_council: String,
    #[serde(default)]
    pub time_reported: String,
}
