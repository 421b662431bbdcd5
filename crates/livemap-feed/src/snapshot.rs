//! Folding raw feed entries into a keyed incident snapshot.

use std::collections::HashMap;

use livemap_core::{Coordinate, IncidentRecord};

use crate::decode::{FeedEntries, RawFeedEntry, RawGeo};
use crate::error::FeedError;
use crate::filters::ExclusionFilters;
use crate::time::{format_local_time, parse_published, LocalTime};
use crate::title::parse_title;

/// Every incident derived from one feed fetch, in feed order.
///
/// Keyed records are unique by `case_id`. Records whose title carried no
/// CAD-ID are kept in [`FeedSnapshot::records`] but have no key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    records: Vec<IncidentRecord>,
    index: HashMap<String, usize>,
    excluded: usize,
    duplicates: usize,
}

impl FeedSnapshot {
    #[must_use]
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, case_id: &str) -> Option<&IncidentRecord> {
        self.index.get(case_id).map(|&idx| &self.records[idx])
    }

    /// Store keys present in this snapshot, in feed order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keyed_records().map(|r| r.case_id.as_str())
    }

    pub fn keyed_records(&self) -> impl Iterator<Item = &IncidentRecord> {
        self.records.iter().filter(|r| r.is_keyed())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entries dropped by the exclusion filters.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Entries that replaced an earlier record with the same `case_id`.
    #[must_use]
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    #[must_use]
    pub fn into_records(self) -> Vec<IncidentRecord> {
        self.records
    }
}

/// Incremental snapshot construction. Call [`SnapshotBuilder::push`] once per
/// entry and [`SnapshotBuilder::finish`] when the feed is exhausted.
pub struct SnapshotBuilder<'f> {
    filters: &'f ExclusionFilters,
    snapshot: FeedSnapshot,
}

impl<'f> SnapshotBuilder<'f> {
    #[must_use]
    pub fn new(filters: &'f ExclusionFilters) -> Self {
        Self {
            filters,
            snapshot: FeedSnapshot::default(),
        }
    }

    pub fn push(&mut self, entry: RawFeedEntry) {
        if let Some(phrase) = self.filters.matching_phrase(&entry.title) {
            tracing::debug!(title = %entry.title, phrase, "feed entry excluded");
            self.snapshot.excluded += 1;
            return;
        }

        let record = normalize(entry);
        let snapshot = &mut self.snapshot;

        if !record.is_keyed() {
            snapshot.records.push(record);
            return;
        }

        if let Some(&idx) = snapshot.index.get(&record.case_id) {
            tracing::warn!(
                case_id = %record.case_id,
                title = %record.title,
                "duplicate CAD-ID in feed; later entry replaces earlier"
            );
            snapshot.duplicates += 1;
            snapshot.records[idx] = record;
        } else {
            snapshot
                .index
                .insert(record.case_id.clone(), snapshot.records.len());
            snapshot.records.push(record);
        }
    }

    #[must_use]
    pub fn finish(self) -> FeedSnapshot {
        self.snapshot
    }
}

fn coordinate(raw: Option<&RawGeo>) -> Coordinate {
    raw.map_or(Coordinate::NotAvailable, RawGeo::to_coordinate)
}

fn normalize(entry: RawFeedEntry) -> IncidentRecord {
    let parsed = parse_title(&entry.title);
    if parsed.case_id.is_empty() {
        tracing::warn!(title = %entry.title, "feed title has no CAD-ID; record will not be stored");
    }

    let published_at = entry.published.as_deref().and_then(parse_published);
    let local = match published_at {
        Some(instant) => format_local_time(&instant),
        None => {
            tracing::warn!(
                title = %entry.title,
                published = ?entry.published,
                "feed entry has no usable publish time"
            );
            LocalTime::invalid()
        }
    };

    let latitude = coordinate(entry.latitude.as_ref());
    let longitude = coordinate(entry.longitude.as_ref());
    if !parsed.case_id.is_empty() && !(latitude.is_available() && longitude.is_available()) {
        tracing::warn!(
            case_id = %parsed.case_id,
            title = %entry.title,
            "feed entry has no usable coordinates"
        );
    }

    IncidentRecord {
        case_id: parsed.case_id,
        title: entry.title,
        incident_type: parsed.incident_type,
        suburb: parsed.suburb,
        local_council: parsed.local_council,
        latitude,
        longitude,
        published_at,
        time_reported: local.time_reported(),
    }
}

/// Folds an already-decoded entry sequence into a snapshot.
pub fn build_snapshot<I>(entries: I, filters: &ExclusionFilters) -> FeedSnapshot
where
    I: IntoIterator<Item = RawFeedEntry>,
{
    let mut builder = SnapshotBuilder::new(filters);
    for entry in entries {
        builder.push(entry);
    }
    builder.finish()
}

/// Decodes `xml` entry by entry into a snapshot.
///
/// # Errors
///
/// Returns the first decode error; no partial snapshot is produced.
pub fn decode_snapshot(xml: &str, filters: &ExclusionFilters) -> Result<FeedSnapshot, FeedError> {
    let mut builder = SnapshotBuilder::new(filters);
    for entry in FeedEntries::new(xml) {
        builder.push(entry?);
    }
    Ok(builder.finish())
}
