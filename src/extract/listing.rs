use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};

use super::Candidate;

/// Scan a map search results feed. Order follows page order (which the
/// source may shuffle between runs); cards can repeat during lazy loading,
/// so names are deduplicated first-wins within the page.
pub fn candidates(html: &str) -> Vec<Candidate> {
    let doc = Html::parse_document(html);

    let item_sel = Selector::parse(r#"div[role="feed"] > div"#).unwrap();
    let link_sel = Selector::parse(r#"a[href*="/maps/place/"]"#).unwrap();
    let rating_sel = Selector::parse(r#"span[role="img"]"#).unwrap();
    let img_sel =
        Selector::parse(r#"img[src*="googleusercontent"], img[src*="lh5"]"#).unwrap();

    let rating_re = Regex::new(r"([\d.]+)").unwrap();
    let review_re = Regex::new(r"(?i)(\d[\d,]*)\s*review").unwrap();
    let price_re = Regex::new(r"\${1,4}").unwrap();
    let street_re = Regex::new(r"(?im)^.*\d+\s+\w+\s+(st|ave|blvd|rd|dr|ln|way|pl)\b.*$").unwrap();

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for item in doc.select(&item_sel) {
        let Some(link) = item.select(&link_sel).next() else {
            continue;
        };
        let name = link.value().attr("aria-label").unwrap_or("").trim().to_string();
        let detail_url = link.value().attr("href").unwrap_or("").to_string();
        if name.is_empty() || detail_url.is_empty() || !seen.insert(name.clone()) {
            continue;
        }

        let rating_label = item
            .select(&rating_sel)
            .next()
            .and_then(|el| el.value().attr("aria-label"))
            .unwrap_or("");
        let rating = rating_re
            .captures(rating_label)
            .and_then(|c| c[1].parse::<f64>().ok());
        let review_count = review_re
            .captures(rating_label)
            .and_then(|c| c[1].replace(',', "").parse::<u32>().ok());

        let card_text = item.text().collect::<Vec<_>>().join("\n");
        let price_range = price_re.find(&card_text).map(|m| m.as_str().to_string());
        let address_hint = street_re
            .find(&card_text)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let image_url = item
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
            address_hint,
            neighborhood_hint: String::new(),
            image_url,
        });
    }

    out
}
