use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use livemap_core::StoreEntry;

use crate::error::StoreError;

/// Characters the realtime database refuses in a key.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// The minimal key-value contract the reconciler writes through.
///
/// Every operation is independent: there are no multi-key transactions, and a
/// failed call leaves other keys untouched.
pub trait IncidentStore: Send + Sync {
    /// Keys currently present under the incident collection.
    fn list_keys(&self) -> impl Future<Output = Result<BTreeSet<String>, StoreError>> + Send;

    /// Every stored entry, keyed by CAD-ID.
    fn read_all(
        &self,
    ) -> impl Future<Output = Result<BTreeMap<String, StoreEntry>, StoreError>> + Send;

    /// Replaces the entry under `key` in full.
    fn set(
        &self,
        key: &str,
        entry: &StoreEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes `key`. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Rejects keys the realtime database would refuse or misroute.
///
/// # Errors
///
/// Returns [`StoreError::InvalidKey`] for empty keys and keys containing any of
/// `. $ # [ ] /` or ASCII control characters.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.contains(FORBIDDEN_KEY_CHARS) {
        "key contains one of . $ # [ ] /"
    } else if key.chars().any(|c| c.is_ascii_control()) {
        "key contains a control character"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidKey {
        key: key.to_owned(),
        reason,
    })
}
