use scraper::Html;

use super::{attr_of, text_of, Details};
use crate::normalize;

/// Pull contact fields off a place detail page. Anything the page does
/// not show comes back as the empty sentinel, never an error.
pub fn details(html: &str) -> Details {
    let doc = Html::parse_document(html);
    Details {
        phone: text_of(&doc, r#"button[data-item-id*="phone"] div.fontBodyMedium"#),
        website: attr_of(&doc, r#"a[data-item-id="authority"]"#, "href"),
        address: text_of(&doc, r#"button[data-item-id="address"] div.fontBodyMedium"#),
        description: text_of(
            &doc,
            r#"div[class*="section-editorial"] span, div.PYvSYb span"#,
        ),
        photo: attr_of(&doc, r#"button[jsaction*="heroHeaderImage"] img"#, "src"),
    }
}

/// Neighborhood for a parsed address: the second-to-last comma segment
/// when the address has one, else the gazetteer fallback.
pub fn neighborhood(address: &str) -> String {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() >= 2 && !parts[parts.len() - 2].is_empty() {
        return parts[parts.len() - 2].to_string();
    }
    normalize::neighborhood_for(address)
}
