use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};

use super::{attr_of, text_of, Candidate, Details};

const ROOT: &str = "https://www.yelp.com";

/// Scan a Yelp search results page. Cards carry their own neighborhood
/// label and a rank-prefixed name ("1. Acme Spa"); names are deduplicated
/// first-wins within the page like the map feed.
pub fn candidates(html: &str) -> Vec<Candidate> {
    let doc = Html::parse_document(html);

    let card_sel = Selector::parse(r#"[data-testid="serp-ia-card"]"#).unwrap();
    let link_sel = Selector::parse(r#"a[href*="/biz/"]"#).unwrap();
    let name_sel = Selector::parse(r#"a[href*="/biz/"] h3, a[href*="/biz/"] span"#).unwrap();
    let rating_sel = Selector::parse(r#"[aria-label*="star rating"]"#).unwrap();
    let review_sel = Selector::parse(r##"a[href*="#reviews"]"##).unwrap();
    let price_sel = Selector::parse("span.priceRange").unwrap();
    let hood_sel = Selector::parse(r#"span[class*="css-"]:not([aria-label])"#).unwrap();
    let img_sel = Selector::parse(r#"img[src*="bphoto"], img[loading]"#).unwrap();

    let rank_re = Regex::new(r"^\d+\.\s*").unwrap();
    let rating_re = Regex::new(r"([\d.]+)").unwrap();
    let count_re = Regex::new(r"(\d+)").unwrap();

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for card in doc.select(&card_sel) {
        let Some(link) = card.select(&link_sel).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or("");
        let raw = card
            .select(&name_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default();
        let name = rank_re.replace(raw.trim(), "").trim().to_string();
        if name.is_empty() || href.is_empty() || !seen.insert(name.clone()) {
            continue;
        }

        let detail_url = if href.starts_with('/') {
            format!("{ROOT}{href}")
        } else {
            href.to_string()
        };

        let rating = card
            .select(&rating_sel)
            .next()
            .and_then(|el| el.value().attr("aria-label"))
            .and_then(|label| rating_re.captures(label))
            .and_then(|c| c[1].parse::<f64>().ok());
        let review_count = card
            .select(&review_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| count_re.captures(&text).and_then(|c| c[1].parse::<u32>().ok()));
        let price_range = card
            .select(&price_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());
        let neighborhood_hint = card
            .select(&hood_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let image_url = card
            .select(&img_sel)
            .next()
            .and_then(|el| el.value().attr("src"))
            .unwrap_or("")
            .to_string();

        out.push(Candidate {
            name,
            detail_url,
            rating,
            review_count,
            price_range,
            address_hint: String::new(),
            neighborhood_hint,
            image_url,
        });
    }

    out
}

/// Contact fields off a Yelp business page. The website link is the site's
/// outbound redirect URL, stored as-is.
pub fn details(html: &str) -> Details {
    let doc = Html::parse_document(html);
    Details {
        phone: text_of(&doc, r#"p[class*="css-"] a[href^="tel:"]"#),
        website: attr_of(&doc, r#"a[href*="biz_redir"][class*="css-"]"#, "href"),
        address: text_of(&doc, r#"address p, [class*="map"] p"#),
        description: text_of(
            &doc,
            r#"[class*="fromTheBusiness"] p, [class*="description"] p"#,
        ),
        photo: String::new(),
    }
}
