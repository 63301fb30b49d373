use std::collections::HashSet;

use crate::record::Business;

/// Intra-batch dedup by slug: first occurrence wins, discovery order is
/// preserved. Feeds repeat cards during lazy loading and near-identical
/// display names ("Acme Spa" vs "Acme Spa ") collapse to one slug.
pub fn dedupe_batch(batch: Vec<Business>) -> Vec<Business> {
    let mut seen = HashSet::new();
    batch
        .into_iter()
        .filter(|b| seen.insert(b.slug.clone()))
        .collect()
}

/// Cross-run filter: drop candidates whose slug already exists in the
/// store snapshot. Combined with [`dedupe_batch`], no create call can
/// carry a repeated or already-known slug.
pub fn filter_known(batch: Vec<Business>, existing: &HashSet<String>) -> Vec<Business> {
    batch
        .into_iter()
        .filter(|b| !existing.contains(&b.slug))
        .collect()
}
