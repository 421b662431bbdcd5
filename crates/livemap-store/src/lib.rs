//! Key-value persistence for incident store entries.
//!
//! [`IncidentStore`] is the minimal contract the reconciler needs. Two
//! implementations ship here: [`RealtimeDbStore`] speaks the realtime-database
//! REST protocol, and [`MemoryStore`] keeps everything in process.

pub mod error;
pub mod memory;
pub mod realtime;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use realtime::RealtimeDbStore;
pub use store::{validate_key, IncidentStore};
