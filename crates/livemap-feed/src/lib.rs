//! Emergency-incident feed ingestion.
//!
//! Fetches the upstream RSS document, decodes it lazily into raw entries, and
//! folds those entries into a [`FeedSnapshot`]: one normalized
//! [`livemap_core::IncidentRecord`] per CAD-ID, with excluded titles dropped
//! and unparseable fields degraded to sentinels instead of failing the batch.

pub mod client;
pub mod decode;
pub mod error;
pub mod filters;
pub mod snapshot;
pub mod time;
pub mod title;

mod retry;

pub use client::FeedClient;
pub use decode::{FeedEntries, RawFeedEntry, RawGeo};
pub use error::FeedError;
pub use filters::ExclusionFilters;
pub use snapshot::{build_snapshot, decode_snapshot, FeedSnapshot, SnapshotBuilder};
pub use time::{format_local_time, parse_published, LocalTime};
pub use title::{parse_title, ParsedTitle};
