use serde_json::{Map, Value};

use crate::extract::Extras;
use crate::normalize::{better_text, sanitize_address};
use crate::record::{
    self, Business, LINE_JOIN, MAX_PHOTOS, MAX_REVIEWS, MAX_SERVICES, REVIEW_JOIN, SERVICES_JOIN,
};

/// Compute the minimal patch that improves on stored data. Monotonic under
/// the better-value policy: a field enters the patch only when the
/// candidate beats what is stored, so repeated passes can never regress a
/// record. An empty map is the explicit "no changes" outcome.
///
/// Never touched here: `slug`, `name`, `category`, `click_count`,
/// `created_at`. The caller stamps `scraped_at` onto non-empty patches.
pub fn build_patch(existing: &Business, found: &Extras) -> Map<String, Value> {
    let mut patch = Map::new();

    if better_text(&existing.description, &found.description) {
        patch.insert(
            "description".to_string(),
            Value::String(found.description.clone()),
        );
    }
    if better_text(&existing.hours, &found.hours) {
        patch.insert("hours".to_string(), Value::String(found.hours.clone()));
    }

    // Image is backfill only: a record that already has one keeps it.
    if existing.image_url.is_empty() && !found.image.is_empty() {
        patch.insert("image_url".to_string(), Value::String(found.image.clone()));
    }

    merge_list(
        &mut patch,
        "services",
        &existing.services,
        &found.services,
        ",",
        SERVICES_JOIN,
        MAX_SERVICES,
    );
    merge_list(
        &mut patch,
        "reviews",
        &existing.reviews,
        &found.reviews,
        "---",
        REVIEW_JOIN,
        MAX_REVIEWS,
    );
    merge_list(
        &mut patch,
        "photos",
        &existing.photos,
        &found.photos,
        "\n",
        LINE_JOIN,
        MAX_PHOTOS,
    );

    // Stored addresses sometimes carry localized script from the source;
    // patch in the sanitized form when it differs.
    let cleaned = sanitize_address(&existing.address);
    if !cleaned.is_empty() && cleaned != existing.address {
        patch.insert("address".to_string(), Value::String(cleaned));
    }

    patch
}

/// List blobs merge as a deduplicated union of stored and candidate
/// items, capped; the field is patched only when the deduplicated count
/// strictly grows. Re-scraping an overlapping set is a no-op.
fn merge_list(
    patch: &mut Map<String, Value>,
    field: &str,
    existing_blob: &str,
    incoming: &[String],
    split_sep: &str,
    join_sep: &str,
    cap: usize,
) {
    if incoming.is_empty() {
        return;
    }

    let existing_items = record::dedup_items(record::split_items(existing_blob, split_sep));
    let mut merged = existing_items.clone();
    merged.extend(incoming.iter().map(|s| s.trim().to_string()));
    let mut merged = record::dedup_items(merged.into_iter().filter(|s| !s.is_empty()));
    merged.truncate(cap);

    if merged.len() > existing_items.len().min(cap) {
        patch.insert(field.to_string(), Value::String(merged.join(join_sep)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Business {
        let mut b = Business::new("Acme Spa", "Med Spas");
        b.description = String::new();
        b.hours = String::new();
        b
    }

    #[test]
    fn fills_absent_fields_then_settles() {
        let existing = acme();
        let found = Extras {
            description: "A full-service spa in Tribeca.".into(),
            hours: "Mon: 9-5\nTue: 9-5".into(),
            ..Default::default()
        };

        let patch = build_patch(&existing, &found);
        assert_eq!(patch.len(), 2);
        assert_eq!(
            patch["description"],
            Value::String("A full-service spa in Tribeca.".into())
        );
        assert_eq!(patch["hours"], Value::String("Mon: 9-5\nTue: 9-5".into()));

        // Second pass with the patch applied: nothing is better anymore.
        let mut updated = existing.clone();
        updated.description = "A full-service spa in Tribeca.".into();
        updated.hours = "Mon: 9-5\nTue: 9-5".into();
        assert!(build_patch(&updated, &found).is_empty());
    }

    #[test]
    fn worse_candidate_never_patches() {
        let mut existing = acme();
        existing.description = "A long, carefully written description of the spa.".into();
        let found = Extras {
            description: "Short blurb.".into(),
            ..Default::default()
        };
        assert!(build_patch(&existing, &found).is_empty());
    }

    #[test]
    fn list_union_dedups_and_caps() {
        let mut existing = acme();
        existing.photos = "https://p/1\nhttps://p/2".into();
        let found = Extras {
            photos: vec![
                "https://p/2".into(),
                "https://p/3".into(),
                "https://p/4".into(),
                "https://p/5".into(),
                "https://p/6".into(),
                "https://p/7".into(),
            ],
            ..Default::default()
        };

        let patch = build_patch(&existing, &found);
        let blob = patch["photos"].as_str().unwrap();
        let items: Vec<&str> = blob.lines().collect();
        assert_eq!(items.len(), MAX_PHOTOS);
        assert_eq!(items[0], "https://p/1");
        let mut deduped = items.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), items.len(), "no duplicate entries");
    }

    #[test]
    fn overlapping_rescrape_is_noop() {
        let mut existing = acme();
        existing.services = "Facials, Peels".into();
        let found = Extras {
            services: vec!["Peels".into(), "Facials".into()],
            ..Default::default()
        };
        assert!(build_patch(&existing, &found).is_empty());
    }

    #[test]
    fn growing_service_set_patches_union() {
        let mut existing = acme();
        existing.services = "Facials".into();
        let found = Extras {
            services: vec!["Facials".into(), "Peels".into()],
            ..Default::default()
        };
        let patch = build_patch(&existing, &found);
        assert_eq!(patch["services"], Value::String("Facials, Peels".into()));
    }

    #[test]
    fn image_backfills_only_when_absent() {
        let found = Extras {
            image: "https://acmespa.example.com/og.jpg".into(),
            ..Default::default()
        };

        let patch = build_patch(&acme(), &found);
        assert_eq!(
            patch["image_url"],
            Value::String("https://acmespa.example.com/og.jpg".into())
        );

        let mut has_image = acme();
        has_image.image_url = "https://p/existing.jpg".into();
        assert!(build_patch(&has_image, &found).is_empty());
    }

    #[test]
    fn address_sanitized_in_place() {
        let mut existing = acme();
        existing.address = "123 Main St، شارع, New York".into();
        let patch = build_patch(&existing, &Extras::default());
        assert_eq!(
            patch["address"],
            Value::String("123 Main St, New York".into())
        );
    }

    #[test]
    fn identity_fields_never_patched() {
        let mut existing = acme();
        existing.services = "Facials".into();
        let found = Extras {
            description: "Long enough to beat the empty sentinel.".into(),
            services: vec!["Facials".into(), "Peels".into()],
            ..Default::default()
        };
        let patch = build_patch(&existing, &found);
        for protected in ["slug", "name", "category", "click_count", "created_at"] {
            assert!(!patch.contains_key(protected));
        }
    }

    #[test]
    fn empty_extras_empty_patch() {
        assert!(build_patch(&acme(), &Extras::default()).is_empty());
    }
}
