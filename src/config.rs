use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Which site a search task runs against. Each origin has its own listing
/// and detail extractors and its own provenance tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    GoogleMaps,
    Yelp,
}

impl Origin {
    pub fn source_tag(self) -> &'static str {
        match self {
            Origin::GoogleMaps => "Google Maps",
            Origin::Yelp => "Yelp",
        }
    }
}

/// One search task: the query typed into the site's search box and the
/// category label stamped on every record it produces.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTask {
    pub query: String,
    pub category: String,
    #[serde(default)]
    pub origin: Origin,
}

/// Per-run context. Owned by a single run and threaded through the
/// orchestrator; nothing here is global.
pub struct RunConfig {
    pub tasks: Vec<SearchTask>,
    /// Detail pages visited per search feed.
    pub max_details_per_search: usize,
    pub feed_scrolls: usize,
    pub scroll_pause: Duration,
    /// Post-navigation delay for late-rendering content.
    pub page_settle: Duration,
    pub nav_timeout: Duration,
    /// Minimum spacing between requests to the same origin.
    pub request_gap: Duration,
    /// Yelp pages results ten at a time; how many result pages to walk.
    pub yelp_result_pages: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tasks: default_tasks(),
            max_details_per_search: 8,
            feed_scrolls: 3,
            scroll_pause: Duration::from_millis(1500),
            page_settle: Duration::from_millis(3000),
            nav_timeout: Duration::from_secs(30),
            request_gap: Duration::from_millis(2000),
            yelp_result_pages: 3,
        }
    }
}

/// Load a task list from a JSON file of `{query, category}` pairs. Tasks
/// are fixed at run start; nothing is discovered at runtime.
pub fn load_tasks(path: &Path) -> Result<Vec<SearchTask>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading task file {}", path.display()))?;
    let tasks: Vec<SearchTask> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing task file {}", path.display()))?;
    anyhow::ensure!(!tasks.is_empty(), "task file {} is empty", path.display());
    Ok(tasks)
}

pub fn default_tasks() -> Vec<SearchTask> {
    [
        ("med spas upper east side new york", "Med Spas"),
        ("luxury med spa manhattan", "Med Spas"),
        ("best facial spa nyc", "Med Spas"),
        ("aesthetic clinic new york", "Med Spas"),
        ("private chef new york city", "Private Chefs"),
        ("personal chef service manhattan", "Private Chefs"),
        ("private dining chef nyc", "Private Chefs"),
        ("luxury interior designer new york", "Interior Designers"),
        ("high end interior design firm manhattan", "Interior Designers"),
        ("residential interior designer nyc", "Interior Designers"),
        ("concierge doctor upper east side manhattan", "Concierge Medicine"),
        ("private physician manhattan", "Concierge Medicine"),
        ("white glove movers upper east side manhattan", "Luxury Relocation"),
        ("fine art movers manhattan", "Luxury Relocation"),
        ("art advisor chelsea manhattan gallery district", "Fine Art Advisory"),
        ("private art consultant manhattan nyc", "Fine Art Advisory"),
    ]
    .into_iter()
    .map(|(query, category)| SearchTask {
        query: query.to_string(),
        category: category.to_string(),
        origin: Origin::GoogleMaps,
    })
    .chain(std::iter::once(SearchTask {
        query: "med spa".to_string(),
        category: "Med Spas".to_string(),
        origin: Origin::Yelp,
    }))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tasks_are_nonempty_and_categorized() {
        let tasks = default_tasks();
        assert!(!tasks.is_empty());
        assert!(tasks.iter().all(|t| !t.query.is_empty() && !t.category.is_empty()));
    }

    #[test]
    fn default_tasks_cover_both_origins() {
        let tasks = default_tasks();
        assert!(tasks.iter().any(|t| t.origin == Origin::GoogleMaps));
        assert!(tasks.iter().any(|t| t.origin == Origin::Yelp));
    }

    #[test]
    fn task_file_origin_defaults_to_google_maps() {
        let task: SearchTask =
            serde_json::from_str(r#"{"query": "med spa", "category": "Med Spas"}"#).unwrap();
        assert_eq!(task.origin, Origin::GoogleMaps);
        let task: SearchTask = serde_json::from_str(
            r#"{"query": "med spa", "category": "Med Spas", "origin": "yelp"}"#,
        )
        .unwrap();
        assert_eq!(task.origin, Origin::Yelp);
    }
}
