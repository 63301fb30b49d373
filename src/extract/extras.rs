use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};

use super::{text_of, Extras};
use crate::record::{MAX_PHOTOS, MAX_REVIEWS, MAX_SERVICES};

/// Enrichment extractor: supplementary fields from an already-known
/// business's place page. Produces only services/hours/reviews/photos;
/// identity fields are immutable after creation.
pub fn extract(html: &str) -> Extras {
    let doc = Html::parse_document(html);
    Extras {
        description: String::new(),
        hours: hours(&doc),
        image: String::new(),
        services: services(&doc),
        reviews: reviews(&doc),
        photos: photos(&doc),
    }
}

/// Weekly hours. Tries the expanded hours table first, then a full-week
/// aria-label, then whatever compact hours text is visible.
fn hours(doc: &Html) -> String {
    let tr_sel = Selector::parse("table tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut rows = Vec::new();
    for tr in doc.select(&tr_sel) {
        let cells: Vec<String> = tr
            .select(&td_sel)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cells.len() >= 2 {
            let day = &cells[0];
            let time = &cells[cells.len() - 1];
            if !day.is_empty() && day.len() < 20 && !time.is_empty() {
                rows.push(format!("{}: {}", day, time));
            }
        }
    }
    if rows.len() >= 5 {
        return rows.join("\n");
    }

    // aria-label form: "Monday, 9 AM to 5 PM; Tuesday, ..."
    let labeled = Selector::parse("[aria-label]").unwrap();
    let day_re = Regex::new(r"(?i)monday|tuesday|wednesday|thursday|friday|saturday|sunday")
        .unwrap();
    for el in doc.select(&labeled) {
        let label = el.value().attr("aria-label").unwrap_or("");
        if label.contains("Monday") && label.contains("Tuesday") {
            let days: Vec<String> = label
                .split([';', '.'])
                .map(str::trim)
                .filter(|p| day_re.is_match(p))
                .map(|p| p.replacen(", ", ": ", 1))
                .collect();
            if days.len() >= 5 {
                return days.join("\n");
            }
            return label.to_string();
        }
    }

    let compact = text_of(doc, r#"[data-item-id="oh"]"#);
    if compact.len() > 5 {
        return compact;
    }
    String::new()
}

/// Amenity/attribute tags from the About region. "No ..." rows are the
/// absent attributes and are skipped.
fn services(doc: &Html) -> Vec<String> {
    let selectors = [
        r#"div[role="region"] li span"#,
        r#"div[aria-label] ul li"#,
    ];

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in selectors {
        let sel = Selector::parse(raw).unwrap();
        for el in doc.select(&sel) {
            let text = el.text().collect::<String>().trim().to_string();
            if text.len() > 2
                && text.len() < 60
                && !text.starts_with("No ")
                && seen.insert(text.clone())
            {
                out.push(text);
                if out.len() == MAX_SERVICES {
                    return out;
                }
            }
        }
    }
    out
}

/// Short review snippets; length bounds filter out truncated stubs and
/// pasted essays.
fn reviews(doc: &Html) -> Vec<String> {
    let sel = Selector::parse("span.wiI7pd, div.MyEned span").unwrap();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in doc.select(&sel) {
        let text = el.text().collect::<String>().trim().to_string();
        if text.len() > 40 && text.len() < 600 && seen.insert(text.clone()) {
            out.push(text);
            if out.len() == MAX_REVIEWS {
                break;
            }
        }
    }
    out
}

/// Photo URLs, upgraded to a usable resolution.
fn photos(doc: &Html) -> Vec<String> {
    let sel = Selector::parse(r#"img[src*="googleusercontent"]"#).unwrap();
    let size_wh = Regex::new(r"=w\d+-h\d+").unwrap();
    let size_s = Regex::new(r"=s\d+").unwrap();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in doc.select(&sel) {
        let src = el.value().attr("src").unwrap_or("");
        if !src.contains('=') || src.contains("default_user") {
            continue;
        }
        let hi_res = size_wh.replace(src, "=w800-h600");
        let hi_res = size_s.replace(&hi_res, "=s800").to_string();
        if seen.insert(hi_res.clone()) {
            out.push(hi_res);
            if out.len() == MAX_PHOTOS {
                break;
            }
        }
    }
    out
}
