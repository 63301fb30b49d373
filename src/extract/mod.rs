pub mod detail;
pub mod extras;
pub mod listing;
pub mod website;
pub mod yelp;

use scraper::{Html, Selector};

/// Lightweight candidate from a search results feed. `detail_url` points
/// at the place page; everything else is best-effort card data.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub detail_url: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub price_range: Option<String>,
    /// Address-looking text from the card, used when the detail page has
    /// no address of its own.
    pub address_hint: String,
    /// Neighborhood label from the card, when the origin shows one.
    pub neighborhood_hint: String,
    pub image_url: String,
}

/// Richer fields from a place detail page. Empty string means the page
/// did not show the field.
#[derive(Debug, Clone, Default)]
pub struct Details {
    pub phone: String,
    pub website: String,
    pub address: String,
    pub description: String,
    pub photo: String,
}

/// Supplementary fields collected during enrichment. Never carries
/// name/category/slug; those are immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct Extras {
    pub description: String,
    pub hours: String,
    /// Hero-image candidate, used only to backfill a record with no image.
    pub image: String,
    pub services: Vec<String>,
    pub reviews: Vec<String>,
    pub photos: Vec<String>,
}

impl Extras {
    /// Fold another page's haul into this one: longer text wins, the first
    /// image found wins, list items append in order (deduplicated
    /// downstream by the merger).
    pub fn absorb(&mut self, other: Extras) {
        if other.description.len() > self.description.len() {
            self.description = other.description;
        }
        if other.hours.len() > self.hours.len() {
            self.hours = other.hours;
        }
        if self.image.is_empty() {
            self.image = other.image;
        }
        self.services.extend(other.services);
        self.reviews.extend(other.reviews);
        self.photos.extend(other.photos);
    }
}

/// Trimmed text of the first match, or empty. A selector that fails to
/// parse behaves like a selector that matches nothing.
pub(crate) fn text_of(doc: &Html, selector: &str) -> String {
    let Ok(sel) = Selector::parse(selector) else {
        return String::new();
    };
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Attribute of the first match, or empty.
pub(crate) fn attr_of(doc: &Html, selector: &str, attr: &str) -> String {
    let Ok(sel) = Selector::parse(selector) else {
        return String::new();
    };
    doc.select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .unwrap_or("")
        .trim()
        .to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn listing_candidates() {
        let cards = listing::candidates(&fixture("listing"));
        assert_eq!(cards.len(), 2, "duplicate card must be dropped");
        let first = &cards[0];
        assert_eq!(first.name, "Acme Spa");
        assert!(first.detail_url.contains("/maps/place/"));
        assert_eq!(first.rating, Some(4.8));
        assert_eq!(first.review_count, Some(1203));
        assert_eq!(first.price_range.as_deref(), Some("$$$"));
        assert!(first.image_url.contains("googleusercontent"));
        assert_eq!(cards[1].name, "Glow Clinic");
        assert_eq!(cards[1].rating, None);
    }

    #[test]
    fn listing_keeps_feed_order() {
        let cards = listing::candidates(&fixture("listing"));
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Spa", "Glow Clinic"]);
    }

    #[test]
    fn listing_empty_page_yields_nothing() {
        assert!(listing::candidates("<html><body></body></html>").is_empty());
    }

    #[test]
    fn yelp_candidates() {
        let cards = yelp::candidates(&fixture("yelp"));
        assert_eq!(cards.len(), 2, "duplicate card must be dropped");
        let first = &cards[0];
        assert_eq!(first.name, "Acme Spa", "rank prefix must be stripped");
        assert!(first.detail_url.starts_with("https://www.yelp.com/biz/"));
        assert_eq!(first.rating, Some(4.5));
        assert_eq!(first.review_count, Some(142));
        assert_eq!(first.price_range.as_deref(), Some("$$"));
        assert_eq!(first.neighborhood_hint, "Tribeca");
        assert!(first.image_url.contains("bphoto"));
        assert_eq!(cards[1].name, "Glow Clinic");
        assert_eq!(cards[1].rating, None);
        assert_eq!(cards[1].price_range, None);
    }

    #[test]
    fn yelp_empty_page_yields_nothing() {
        assert!(yelp::candidates("<html><body></body></html>").is_empty());
    }

    #[test]
    fn yelp_detail_fields() {
        let d = yelp::details(&fixture("yelp_detail"));
        assert_eq!(d.phone, "(212) 555-0144");
        assert!(d.website.contains("biz_redir"));
        assert_eq!(d.address, "250 Mercer St, New York, NY 10012");
        assert!(d.description.starts_with("Boutique"));
    }

    #[test]
    fn detail_fields() {
        let d = detail::details(&fixture("detail"));
        assert_eq!(d.phone, "(212) 555-0190");
        assert_eq!(d.website, "https://acmespa.example.com");
        assert_eq!(d.address, "10 Hudson St, Tribeca, New York, NY 10013");
        assert!(d.description.starts_with("A full-service"));
        assert!(d.photo.contains("hero"));
    }

    #[test]
    fn detail_missing_markup_is_absence_not_error() {
        let d = detail::details("<html><body><p>nothing here</p></body></html>");
        assert_eq!(d.phone, "");
        assert_eq!(d.website, "");
        assert_eq!(d.address, "");
    }

    #[test]
    fn detail_neighborhood_prefers_address_segment() {
        assert_eq!(
            detail::neighborhood("10 Hudson St, Tribeca, New York, NY 10013"),
            "New York"
        );
        // Too few segments: gazetteer takes over.
        assert_eq!(detail::neighborhood("somewhere in Tribeca"), "Tribeca");
        assert_eq!(detail::neighborhood(""), "");
    }

    #[test]
    fn place_extras() {
        let x = extras::extract(&fixture("place"));
        let hours: Vec<&str> = x.hours.lines().collect();
        assert_eq!(hours.len(), 7);
        assert_eq!(hours[0], "Monday: 9 AM–5 PM");
        assert!(x.services.contains(&"Wheelchair accessible entrance".to_string()));
        assert!(!x.services.iter().any(|s| s.starts_with("No ")));
        assert_eq!(x.reviews.len(), 2);
        assert!(x.reviews[0].len() > 40);
        // Duplicate photo URL collapses; low-res size params are upgraded.
        assert_eq!(x.photos.len(), 2);
        assert!(x.photos.iter().all(|p| p.contains("=w800-h600")));
    }

    #[test]
    fn place_extras_never_exceed_caps() {
        let x = extras::extract(&fixture("place"));
        assert!(x.services.len() <= crate::record::MAX_SERVICES);
        assert!(x.reviews.len() <= crate::record::MAX_REVIEWS);
        assert!(x.photos.len() <= crate::record::MAX_PHOTOS);
    }

    #[test]
    fn website_meta_description_wins() {
        let w = website::scrape(&fixture("website"));
        assert_eq!(
            w.description,
            "A full-service spa in Tribeca offering facials, peels and massage."
        );
        assert!(w.services.contains(&"Signature Facial".to_string()));
        assert!(w.services.contains(&"Deep Tissue Massage".to_string()));
        // Nav items without service keywords are noise.
        assert!(!w.services.contains(&"Contact Us".to_string()));
        assert_eq!(w.image, "https://acmespa.example.com/og.jpg");
    }

    #[test]
    fn website_image_fallback_skips_logos() {
        let html = r#"<html><body><main>
            <img src="/assets/logo.png" width="400">
            <img src="//cdn.example.com/photos/storefront.jpg" width="640" height="420">
        </main></body></html>"#;
        let w = website::scrape(html);
        assert_eq!(w.image, "https://cdn.example.com/photos/storefront.jpg");
    }

    #[test]
    fn website_paragraph_fallback_skips_boilerplate() {
        let html = r#"<html><head></head><body><main>
            <p>We use cookies to improve your experience on this site and more.</p>
            <p>Our studio has served downtown clients with bespoke interior design for twenty years.</p>
        </main></body></html>"#;
        let w = website::scrape(html);
        assert!(w.description.starts_with("Our studio"));
    }

    #[test]
    fn absorb_prefers_longer_text() {
        let mut a = Extras {
            description: "short".into(),
            ..Default::default()
        };
        a.absorb(Extras {
            description: "a much longer description".into(),
            services: vec!["Facials".into()],
            ..Default::default()
        });
        assert_eq!(a.description, "a much longer description");
        assert_eq!(a.services, vec!["Facials"]);
    }

    #[test]
    fn absorb_keeps_first_image() {
        let mut a = Extras {
            image: "https://p/first.jpg".into(),
            ..Default::default()
        };
        a.absorb(Extras {
            image: "https://p/second.jpg".into(),
            ..Default::default()
        });
        assert_eq!(a.image, "https://p/first.jpg");
    }
}
