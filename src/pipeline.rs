use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{info, warn};

use crate::browser::{self, Navigator};
use crate::config::{Origin, RunConfig, SearchTask};
use crate::dedupe;
use crate::extract::{detail, extras, listing, website, yelp, Candidate, Details, Extras};
use crate::normalize;
use crate::pace::Pacer;
use crate::record::Business;
use crate::store::{self, Store};

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})";

pub struct AcquireStats {
    pub tasks: usize,
    pub skipped_tasks: usize,
    pub found: usize,
    pub fresh: usize,
    pub created: usize,
    pub failed: usize,
}

#[derive(Default)]
pub struct EnrichStats {
    pub attempted: usize,
    pub enriched: usize,
    pub unchanged: usize,
    pub failed_writes: usize,
}

/// One acquisition run: each search task in declared order, one page
/// loading at a time. Navigation failures skip the task; only a store
/// failure before navigation is fatal.
pub async fn acquire(store: &Store, cfg: &RunConfig, limit: Option<usize>) -> Result<AcquireStats> {
    // Slug snapshot before anything else. We assume we are the only
    // writer for the duration of the run.
    let existing = store.existing_slugs().await?;
    info!("{} slugs already in store", existing.len());

    let tasks: Vec<&SearchTask> = cfg
        .tasks
        .iter()
        .take(limit.unwrap_or(cfg.tasks.len()))
        .collect();

    let nav = Navigator::launch().await?;
    let mut pacer = Pacer::new(cfg.request_gap);
    let mut all = Vec::new();
    let mut skipped_tasks = 0;

    for task in &tasks {
        pacer.pause().await;
        println!("Searching: {}", task.query);
        match scrape_search(&nav, task, cfg).await {
            Ok(found) => {
                println!("  {} candidates", found.len());
                all.extend(found);
            }
            Err(e) => {
                warn!("search '{}' skipped: {}", task.query, e);
                skipped_tasks += 1;
            }
        }
    }
    nav.close().await;

    let found = all.len();
    let unique = dedupe::dedupe_batch(all);
    let fresh = dedupe::filter_known(unique, &existing);
    println!(
        "{} found, {} new ({} duplicates skipped)",
        found,
        fresh.len(),
        found - fresh.len()
    );

    let (created, failed) = store.create_batch(&fresh).await;

    Ok(AcquireStats {
        tasks: tasks.len(),
        skipped_tasks,
        found,
        fresh: fresh.len(),
        created,
        failed,
    })
}

async fn scrape_search(
    nav: &Navigator,
    task: &SearchTask,
    cfg: &RunConfig,
) -> browser::Result<Vec<Business>> {
    let mut out = Vec::new();
    for url in search_urls(task, cfg) {
        let page = nav.open(&url, cfg.nav_timeout).await?;
        page.settle(cfg.page_settle).await;
        if task.origin == Origin::GoogleMaps {
            page.scroll_feed(cfg.feed_scrolls, cfg.scroll_pause).await;
        }
        let html = page.html().await?;
        page.close().await;

        let cards = match task.origin {
            Origin::GoogleMaps => listing::candidates(&html),
            Origin::Yelp => yelp::candidates(&html),
        };

        for card in cards.into_iter().take(cfg.max_details_per_search) {
            match visit_detail(nav, &card, task, cfg).await {
                Ok(biz) => {
                    let shown = biz
                        .rating
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "n/a".to_string());
                    println!("    + {} ({})", biz.name, shown);
                    out.push(biz);
                }
                Err(e) => warn!("    ! {}: {}", card.name, e),
            }
            tokio::time::sleep(cfg.request_gap).await;
        }
    }
    Ok(out)
}

/// Google Maps shows everything on one lazily scrolled page; Yelp pages
/// its results ten at a time.
fn search_urls(task: &SearchTask, cfg: &RunConfig) -> Vec<String> {
    match task.origin {
        Origin::GoogleMaps => vec![format!(
            "https://www.google.com/maps/search/{}?hl=en",
            urlencoding::encode(&task.query)
        )],
        Origin::Yelp => (0..cfg.yelp_result_pages)
            .map(|n| {
                format!(
                    "https://www.yelp.com/search?find_desc={}&find_loc=New+York%2C+NY&start={}",
                    urlencoding::encode(&task.query),
                    n * 10
                )
            })
            .collect(),
    }
}

/// Nested sequential visit: one detail page per candidate, parsed by the
/// origin's detail extractor.
async fn visit_detail(
    nav: &Navigator,
    card: &Candidate,
    task: &SearchTask,
    cfg: &RunConfig,
) -> browser::Result<Business> {
    let page = nav.open(&card.detail_url, cfg.nav_timeout).await?;
    page.settle(cfg.page_settle).await;
    let html = page.html().await?;
    page.close().await;

    let d = match task.origin {
        Origin::GoogleMaps => detail::details(&html),
        Origin::Yelp => yelp::details(&html),
    };
    Ok(assemble(card, &d, task))
}

/// Card and detail fields normalized into a full record shape. Detail
/// fields win over card hints where both exist.
fn assemble(card: &Candidate, d: &Details, task: &SearchTask) -> Business {
    let address = if d.address.is_empty() {
        card.address_hint.clone()
    } else {
        d.address.clone()
    };

    let mut biz = Business::new(&card.name, &task.category);
    biz.neighborhood = if card.neighborhood_hint.is_empty() {
        detail::neighborhood(&address)
    } else {
        card.neighborhood_hint.clone()
    };
    biz.address = normalize::sanitize_address(&address);
    biz.phone = d.phone.clone();
    biz.website = d.website.clone();
    biz.description = d.description.clone();
    biz.image_url = if d.photo.is_empty() {
        card.image_url.clone()
    } else {
        d.photo.clone()
    };
    biz.rating = card.rating;
    biz.review_count = card.review_count;
    biz.price_range = card.price_range.clone();
    biz.source = task.origin.source_tag().to_string();
    biz
}

/// One enrichment run over the stored records: place page extras, then
/// the business's own website, then the monotonic merge. Per-record
/// failures are logged and skipped; an empty patch writes nothing.
pub async fn enrich(
    store: &Store,
    cfg: &RunConfig,
    category: Option<&str>,
    limit: Option<usize>,
) -> Result<EnrichStats> {
    let mut records = store.list_all(&[]).await?;
    records.retain(|r| !r.fields.name.is_empty());
    if let Some(cat) = category {
        records.retain(|r| r.fields.category == cat);
    }
    if let Some(n) = limit {
        records.truncate(n);
    }
    info!("{} records to enrich", records.len());

    let mut stats = EnrichStats::default();
    if records.is_empty() {
        return Ok(stats);
    }

    // Everything fallible happens before the session launches; from here
    // to close() the only exits are the loop ending or a panic, and Drop
    // covers the panic.
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)?
        .progress_chars("=> ");

    let nav = Navigator::launch().await?;
    let mut pacer = Pacer::new(cfg.request_gap);

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(style);

    for rec in &records {
        stats.attempted += 1;
        pacer.pause().await;

        let mut found = match place_extras(&nav, &rec.fields, cfg).await {
            Ok(x) => x,
            Err(e) => {
                pb.println(format!("  ! {}: {}", rec.fields.name, e));
                Extras::default()
            }
        };

        if website_eligible(&rec.fields.website) {
            pacer.pause().await;
            match website_extras(&nav, &rec.fields.website, cfg).await {
                Ok(w) => found.absorb(w),
                Err(e) => pb.println(format!("  ! {} website: {}", rec.fields.name, e)),
            }
        }

        let mut patch = crate::merge::build_patch(&rec.fields, &found);
        if patch.is_empty() {
            pb.println(format!("  {}: no changes", rec.fields.name));
            stats.unchanged += 1;
        } else {
            let fields: Vec<&str> = patch.keys().map(String::as_str).collect();
            pb.println(format!("  {}: {}", rec.fields.name, fields.join(", ")));
            patch.insert("scraped_at".to_string(), Value::String(store::today()));
            match store.patch(&rec.id, patch).await {
                Ok(()) => stats.enriched += 1,
                Err(e) => {
                    pb.println(format!("  ! {} update failed: {}", rec.fields.name, e));
                    stats.failed_writes += 1;
                }
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    nav.close().await;
    Ok(stats)
}

/// Link aggregators and social profiles have nothing worth scraping.
fn website_eligible(website: &str) -> bool {
    !website.is_empty()
        && !website.contains("linktr.ee")
        && !website.contains("instagram.com")
}

/// Look the business up on the map site and harvest supplementary fields
/// from its place page: expanded hours, About-tab amenities, review
/// snippets, photos.
async fn place_extras(
    nav: &Navigator,
    biz: &Business,
    cfg: &RunConfig,
) -> browser::Result<Extras> {
    let city = if biz.city.is_empty() {
        "New York"
    } else {
        biz.city.as_str()
    };
    let url = format!(
        "https://www.google.com/maps/search/{}?hl=en",
        urlencoding::encode(&format!("{} {}", biz.name, city))
    );

    let page = nav.open(&url, cfg.nav_timeout).await?;
    page.settle(cfg.page_settle).await;

    // A search can land on a results page; promote to the place page.
    if page
        .click(r#"div[role="feed"] a[href*="/maps/place/"]"#)
        .await
    {
        page.settle(cfg.page_settle).await;
    }

    if page.click(r#"button[data-item-id="oh"]"#).await {
        page.settle(cfg.scroll_pause).await;
    }
    let mut found = extras::extract(&page.html().await?);

    if page.click(r#"button[aria-label="About"]"#).await {
        page.settle(cfg.scroll_pause).await;
        found.absorb(extras::extract(&page.html().await?));
    }

    if page.click(r#"button[aria-label="Reviews"]"#).await {
        page.settle(cfg.page_settle).await;
        found.absorb(extras::extract(&page.html().await?));
    }

    page.close().await;
    Ok(found)
}

async fn website_extras(
    nav: &Navigator,
    url: &str,
    cfg: &RunConfig,
) -> browser::Result<Extras> {
    let page = nav.open(url, cfg.nav_timeout).await?;
    page.settle(cfg.page_settle).await;
    let html = page.html().await?;
    page.close().await;
    Ok(website::scrape(&html))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_template_is_valid() {
        assert!(ProgressStyle::default_bar().template(PROGRESS_TEMPLATE).is_ok());
    }

    #[test]
    fn website_skip_list() {
        assert!(website_eligible("https://acmespa.example.com"));
        assert!(!website_eligible(""));
        assert!(!website_eligible("https://linktr.ee/acmespa"));
        assert!(!website_eligible("https://www.instagram.com/acmespa"));
    }

    #[test]
    fn yelp_search_pages_ten_apart() {
        let cfg = RunConfig::default();
        let task = SearchTask {
            query: "med spa".to_string(),
            category: "Med Spas".to_string(),
            origin: Origin::Yelp,
        };
        let urls = search_urls(&task, &cfg);
        assert_eq!(urls.len(), cfg.yelp_result_pages);
        assert!(urls[0].ends_with("start=0"));
        assert!(urls[1].ends_with("start=10"));
    }

    #[test]
    fn maps_search_is_one_page() {
        let cfg = RunConfig::default();
        let task = SearchTask {
            query: "med spas upper east side".to_string(),
            category: "Med Spas".to_string(),
            origin: Origin::GoogleMaps,
        };
        let urls = search_urls(&task, &cfg);
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("google.com/maps/search/"));
    }

    #[test]
    fn assemble_prefers_card_neighborhood_hint() {
        let card = Candidate {
            name: "Acme Spa".to_string(),
            detail_url: "https://www.yelp.com/biz/acme-spa-new-york".to_string(),
            rating: Some(4.5),
            review_count: Some(142),
            price_range: Some("$$".to_string()),
            address_hint: String::new(),
            neighborhood_hint: "Tribeca".to_string(),
            image_url: "https://p/card.jpg".to_string(),
        };
        let d = Details {
            address: "250 Mercer St, New York, NY 10012".to_string(),
            ..Default::default()
        };
        let task = SearchTask {
            query: "med spa".to_string(),
            category: "Med Spas".to_string(),
            origin: Origin::Yelp,
        };

        let biz = assemble(&card, &d, &task);
        assert_eq!(biz.neighborhood, "Tribeca");
        assert_eq!(biz.source, "Yelp");
        assert_eq!(biz.image_url, "https://p/card.jpg");
        assert_eq!(biz.slug, "acme-spa");
    }
}
