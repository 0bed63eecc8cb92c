//! Drop metadata entries by key prefix.

use tracing::debug;

use crate::types::MetadataStore;

/// Keep only the entries whose key starts with none of `prefixes`.
///
/// Matching is exact and case-sensitive. An empty prefix list returns the
/// store unchanged.
pub fn exclude_prefixes<S: AsRef<str>>(mut store: MetadataStore, prefixes: &[S]) -> MetadataStore {
    if prefixes.is_empty() {
        return store;
    }
    let before = store.len();
    store.retain(|key| should_include(key, prefixes));
    debug!(removed = before - store.len(), kept = store.len(), "excluded metadata keys");
    store
}

/// `true` when `key` matches none of the excluded prefixes.
pub fn should_include<S: AsRef<str>>(key: &str, prefixes: &[S]) -> bool {
    !prefixes.iter().any(|p| key.starts_with(p.as_ref()))
}
