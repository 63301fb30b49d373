use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{attr_of, Extras};

const MAX_DESCRIPTION: usize = 500;
const MAX_WEBSITE_SERVICES: usize = 15;

/// Target-website extractor: description, service names, and a hero-image
/// candidate from a business's own site.
pub fn scrape(html: &str) -> Extras {
    let doc = Html::parse_document(html);
    Extras {
        description: description(&doc),
        services: services(&doc),
        image: image(&doc),
        ..Extras::default()
    }
}

/// Meta description first, then the first believable body paragraph.
/// Cookie notices and copyright footers are the usual traps.
fn description(doc: &Html) -> String {
    let mut description = attr_of(doc, r#"meta[name="description"]"#, "content");
    if description.len() <= 30 {
        let og = attr_of(doc, r#"meta[property="og:description"]"#, "content");
        if og.len() > 30 {
            description = og;
        }
    }

    if description.len() < 40 {
        let p_sel = Selector::parse(
            "main p, .about p, .hero p, .intro p, section p, \
             [class*=\"description\"] p, [class*=\"about\"] p",
        )
        .unwrap();
        for p in doc.select(&p_sel) {
            let text = p.text().collect::<String>().trim().to_string();
            let lower = text.to_lowercase();
            if text.len() > 50
                && text.len() < 500
                && !lower.contains("cookie")
                && !text.contains('©')
            {
                description = text;
                break;
            }
        }
    }

    if description.len() > MAX_DESCRIPTION {
        description = description.chars().take(MAX_DESCRIPTION).collect();
    }
    description
}

/// Hero-image candidate: og:image, else the first content image placed
/// like a hero, else anything explicitly sized like one. Logos, icons and
/// inline svg assets are the usual traps.
fn image(doc: &Html) -> String {
    let og = attr_of(doc, r#"meta[property="og:image"]"#, "content");
    if !og.is_empty() {
        return absolutize(&og);
    }

    let placed = Selector::parse(
        "[class*=\"hero\"] img, [class*=\"banner\"] img, header img, main img",
    )
    .unwrap();
    for el in doc.select(&placed) {
        if let Some(src) = content_image(el) {
            return src;
        }
    }

    let any = Selector::parse("img").unwrap();
    for el in doc.select(&any) {
        if dimension(el, "width") >= 300 || dimension(el, "height") >= 200 {
            if let Some(src) = content_image(el) {
                return src;
            }
        }
    }
    String::new()
}

fn content_image(el: ElementRef) -> Option<String> {
    let src = el
        .value()
        .attr("src")
        .or_else(|| el.value().attr("data-src"))
        .unwrap_or("");
    let lower = src.to_lowercase();
    if src.is_empty()
        || src.starts_with("data:")
        || lower.contains("logo")
        || lower.contains("icon")
        || lower.contains("svg")
    {
        return None;
    }
    Some(absolutize(src))
}

fn dimension(el: ElementRef, attr: &str) -> u32 {
    el.value()
        .attr(attr)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Protocol-relative URLs come back from og tags often enough to handle.
fn absolutize(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

fn services(doc: &Html) -> Vec<String> {
    let sel = Selector::parse(
        "h2, h3, h4, [class*=\"treatment\"] li, [class*=\"service\"] li, \
         nav a, .menu a, [class*=\"menu\"] a",
    )
    .unwrap();

    let keywords = Regex::new(
        "(?i)service|treatment|facial|botox|filler|laser|peel|micro|massage|injection\
         |sculpt|consult|chef|menu|cuisine|cook|dining|interior|residential|commercial\
         |renovation|remodel|wellness|therapy|concierge|medical|moving|relocation\
         |art|gallery|apprais|collect|advis|curator|design",
    )
    .unwrap();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for el in doc.select(&sel) {
        let text = el.text().collect::<String>().trim().to_string();
        if text.len() > 3
            && text.len() < 50
            && keywords.is_match(&text)
            && seen.insert(text.clone())
        {
            out.push(text);
            if out.len() == MAX_WEBSITE_SERVICES {
                break;
            }
        }
    }
    out
}
