use std::collections::HashSet;

use serde::Deserialize;

use crate::normalize::slugify;

/// List-blob caps. The store holds each list as a delimiter-joined text
/// blob; extraction and merge never let one grow past its cap.
pub const MAX_SERVICES: usize = 20;
pub const MAX_PHOTOS: usize = 5;
pub const MAX_REVIEWS: usize = 3;

pub const SERVICES_JOIN: &str = ", ";
pub const LINE_JOIN: &str = "\n";
pub const REVIEW_JOIN: &str = "\n---\n";

/// Canonical business record, shaped like the store's table. Empty string
/// is the absence sentinel for every text field so merge and compare logic
/// never special-cases a missing field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Business {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub price_range: Option<String>,
    /// Comma-joined tags, at most [`MAX_SERVICES`].
    #[serde(default)]
    pub services: String,
    /// Newline-joined "Day: time" lines.
    #[serde(default)]
    pub hours: String,
    /// Review snippets separated by a `---` line, at most [`MAX_REVIEWS`].
    #[serde(default)]
    pub reviews: String,
    /// Newline-joined photo URLs, at most [`MAX_PHOTOS`].
    #[serde(default)]
    pub photos: String,
    #[serde(default)]
    pub source: String,
    /// Owned by the serving layer. Written as 0 at creation, never after.
    #[serde(default)]
    pub click_count: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub scraped_at: String,
}

impl Business {
    /// New record with every field at its absence sentinel. The slug is
    /// the record's natural key and is fixed here, at creation.
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            slug: slugify(name),
            name: name.trim().to_string(),
            category: category.to_string(),
            city: "New York".to_string(),
            ..Self::default()
        }
    }
}

/// Split a delimiter-joined blob into trimmed, non-empty items.
pub fn split_items(blob: &str, sep: &str) -> Vec<String> {
    blob.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Deduplicate preserving first occurrence.
pub fn dedup_items(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_fills_sentinels() {
        let b = Business::new("Acme Spa", "Med Spas");
        assert_eq!(b.slug, "acme-spa");
        assert_eq!(b.city, "New York");
        assert_eq!(b.address, "");
        assert_eq!(b.rating, None);
        assert_eq!(b.click_count, 0);
    }

    #[test]
    fn split_drops_empty_items() {
        let items = split_items("a, , b,,c", ",");
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn review_blob_round_trip() {
        let blob = ["first snippet", "second snippet"].join(REVIEW_JOIN);
        assert_eq!(
            split_items(&blob, "---"),
            vec!["first snippet", "second snippet"]
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let items = dedup_items(vec!["x".into(), "y".into(), "x".into()]);
        assert_eq!(items, vec!["x", "y"]);
    }
}
