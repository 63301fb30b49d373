use regex::Regex;

/// Known neighborhoods, checked in order; first case-insensitive substring
/// match wins.
const NEIGHBORHOODS: &[&str] = &[
    "Upper East Side",
    "Upper West Side",
    "Tribeca",
    "SoHo",
    "Chelsea",
    "Midtown",
    "Flatiron",
    "Greenwich Village",
    "West Village",
    "East Village",
    "Lower East Side",
    "Williamsburg",
    "DUMBO",
    "Park Slope",
    "Brooklyn Heights",
    "NoHo",
    "Nolita",
    "Financial District",
    "Murray Hill",
    "Gramercy",
];

/// Natural key derivation: lowercase, every maximal run of non-[a-z0-9]
/// collapsed to a single hyphen, leading/trailing hyphens stripped.
/// Idempotent and deterministic.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            out.push(c);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Strip characters outside the Latin script blocks (some sources localize
/// addresses into other scripts), then collapse the punctuation and
/// whitespace debris left behind. Total: never fails, empty in, empty out.
pub fn sanitize_address(address: &str) -> String {
    let kept: String = address
        .chars()
        .filter(|c| c.is_ascii() || ('\u{00C0}'..='\u{024F}').contains(c))
        .collect();

    let dup_commas = Regex::new(r",(\s*,)+").unwrap();
    let collapsed = dup_commas.replace_all(&kept, ",");
    let comma_spacing = Regex::new(r"\s*,\s*").unwrap();
    let collapsed = comma_spacing.replace_all(&collapsed, ", ");
    let spaces = Regex::new(r"\s+").unwrap();
    let collapsed = spaces.replace_all(&collapsed, " ");

    collapsed
        .trim()
        .trim_start_matches(',')
        .trim_end_matches(',')
        .trim()
        .to_string()
}

/// Merge policy for free-text fields: the candidate must be non-empty and
/// strictly longer than what is stored. Covers the absent-to-present case
/// since the sentinel has length zero.
pub fn better_text(old: &str, new: &str) -> bool {
    !new.is_empty() && new.len() > old.len()
}

/// Gazetteer lookup with a borough-level fallback; empty when the address
/// names nothing we know.
pub fn neighborhood_for(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let lower = address.to_lowercase();
    for hood in NEIGHBORHOODS {
        if lower.contains(&hood.to_lowercase()) {
            return hood.to_string();
        }
    }
    if address.contains("New York") || address.contains("Manhattan") {
        return "Manhattan".to_string();
    }
    if address.contains("Brooklyn") {
        return "Brooklyn".to_string();
    }
    String::new()
}
