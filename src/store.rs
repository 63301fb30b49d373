use std::collections::BTreeMap;
use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::error;

use crate::error::StoreError;
use crate::record::Business;

const PAGE_SIZE: usize = 100;
/// The store rejects create calls above this size.
const MAX_BATCH: usize = 10;
const CHUNK_GAP: Duration = Duration::from_millis(250);

pub type Result<T> = std::result::Result<T, StoreError>;

/// REST client for the record store. The pipeline only uses the narrow
/// contract: paged listing, batched creation, per-record patching.
pub struct Store {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Business,
}

#[derive(Deserialize)]
struct ListPage {
    #[serde(default)]
    records: Vec<StoreRecord>,
    offset: Option<String>,
}

impl Store {
    /// Credentials come from the environment. A missing value is fatal
    /// here, before any navigation happens.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("AIRTABLE_API_KEY")
            .map_err(|_| StoreError::MissingConfig("AIRTABLE_API_KEY"))?;
        let base_id = std::env::var("AIRTABLE_BASE_ID")
            .map_err(|_| StoreError::MissingConfig("AIRTABLE_BASE_ID"))?;
        let table =
            std::env::var("AIRTABLE_TABLE").unwrap_or_else(|_| "Businesses".to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "https://api.airtable.com/v0/{}/{}",
                base_id,
                urlencoding::encode(&table)
            ),
            api_key,
        })
    }

    /// Full paged listing; follows the opaque offset token until the store
    /// stops returning one. `fields` narrows the response payload.
    pub async fn list_all(&self, fields: &[&str]) -> Result<Vec<StoreRecord>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut req = self
                .client
                .get(&self.base_url)
                .bearer_auth(&self.api_key)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            for f in fields {
                req = req.query(&[("fields[]", *f)]);
            }
            if let Some(ref o) = offset {
                req = req.query(&[("offset", o.as_str())]);
            }

            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(StoreError::Api {
                    status: status.as_u16(),
                    message: resp.text().await.unwrap_or_default(),
                });
            }

            let page: ListPage = resp.json().await?;
            records.extend(page.records);
            match page.offset {
                Some(o) => offset = Some(o),
                None => break,
            }
        }

        Ok(records)
    }

    /// Slug snapshot used for cross-run dedup.
    pub async fn existing_slugs(&self) -> Result<HashSet<String>> {
        Ok(self
            .list_all(&["slug"])
            .await?
            .into_iter()
            .map(|r| r.fields.slug)
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Create records in store-sized chunks, sequentially, with a small
    /// gap between chunks. A failed chunk is logged and skipped; callers
    /// see aggregate (created, failed) counts only.
    pub async fn create_batch(&self, records: &[Business]) -> (usize, usize) {
        let mut created = 0;
        let mut failed = 0;
        let stamp = today();

        for (i, chunk) in records.chunks(MAX_BATCH).enumerate() {
            let payload = json!({
                "records": chunk
                    .iter()
                    .map(|b| json!({ "fields": create_fields(b, &stamp) }))
                    .collect::<Vec<_>>(),
            });

            match self.post_chunk(&payload).await {
                Ok(()) => created += chunk.len(),
                Err(e) => {
                    error!("create batch {} failed: {}", i + 1, e);
                    failed += chunk.len();
                }
            }

            if (i + 1) * MAX_BATCH < records.len() {
                tokio::time::sleep(CHUNK_GAP).await;
            }
        }

        (created, failed)
    }

    async fn post_chunk(&self, payload: &Value) -> Result<()> {
        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Single-record partial update.
    pub async fn patch(&self, id: &str, fields: Map<String, Value>) -> Result<()> {
        let resp = self
            .client
            .patch(format!("{}/{}", self.base_url, id))
            .bearer_auth(&self.api_key)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Field-coverage summary for the stats command.
    pub async fn coverage(&self) -> Result<Coverage> {
        let records = self.list_all(&[]).await?;
        let mut cov = Coverage {
            total: records.len(),
            ..Coverage::default()
        };
        let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
        for r in &records {
            let f = &r.fields;
            if !f.website.is_empty() {
                cov.with_website += 1;
            }
            if !f.description.is_empty() {
                cov.with_description += 1;
            }
            if !f.hours.is_empty() {
                cov.with_hours += 1;
            }
            if !f.services.is_empty() {
                cov.with_services += 1;
            }
            if !f.photos.is_empty() {
                cov.with_photos += 1;
            }
            if !f.category.is_empty() {
                *by_category.entry(f.category.clone()).or_default() += 1;
            }
        }
        cov.by_category = by_category.into_iter().collect();
        Ok(cov)
    }
}

#[derive(Debug, Default)]
pub struct Coverage {
    pub total: usize,
    pub with_website: usize,
    pub with_description: usize,
    pub with_hours: usize,
    pub with_services: usize,
    pub with_photos: usize,
    pub by_category: Vec<(String, usize)>,
}

pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Creation field map. Every field lands with its documented sentinel or
/// value; `click_count` starts at 0 and belongs to the serving layer from
/// then on.
fn create_fields(b: &Business, stamp: &str) -> Value {
    json!({
        "name": b.name,
        "slug": b.slug,
        "category": b.category,
        "city": b.city,
        "neighborhood": b.neighborhood,
        "address": b.address,
        "phone": b.phone,
        "website": b.website,
        "description": b.description,
        "image_url": b.image_url,
        "rating": b.rating,
        "review_count": b.review_count,
        "price_range": b.price_range,
        "services": b.services,
        "hours": b.hours,
        "reviews": b.reviews,
        "photos": b.photos,
        "source": b.source,
        "click_count": 0,
        "created_at": stamp,
        "scraped_at": stamp,
    })
}
