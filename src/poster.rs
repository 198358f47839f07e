use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::batch::DailyBatch;
use crate::content::{ContentKind, ContentRecord, Fact, Recipe};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// What happened to one day's worth of posts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
}

impl PostSummary {
    fn absorb(&mut self, other: PostSummary) {
        self.accepted += other.accepted;
        self.rejected += other.rejected;
        self.skipped += other.skipped;
    }
}

/// One `POST /api/<kind>/create` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePayload {
    pub kind: ContentKind,
    pub body: Value,
}

/// Builds the create payloads for a batch. Records that cannot be posted are
/// counted in the returned skip count.
pub fn payloads_for(batch: &DailyBatch) -> (Vec<CreatePayload>, usize) {
    let date = batch.date.format("%Y-%m-%d").to_string();
    let mut payloads = Vec::new();
    let mut skipped = 0;

    for (category, record) in batch.recipes.iter() {
        match recipe_body(&date, category, record) {
            Some(body) => payloads.push(CreatePayload {
                kind: ContentKind::Recipe,
                body,
            }),
            None => {
                warn!(date = %date, category = %category, "skipping recipe without usable content");
                skipped += 1;
            }
        }
    }

    match &batch.jokes {
        ContentRecord::Typed { typed: jokes, .. } => {
            for joke in jokes.jokes() {
                payloads.push(CreatePayload {
                    kind: ContentKind::JokeSet,
                    body: json!({ "joke": { "date": date, "content": joke } }),
                });
            }
        }
        _ => {
            warn!(date = %date, "skipping jokes without usable content");
            skipped += 1;
        }
    }

    for (category, record) in batch.facts.iter() {
        match fact_body(&date, category, record) {
            Some(body) => payloads.push(CreatePayload {
                kind: ContentKind::Fact,
                body,
            }),
            None => {
                warn!(date = %date, category = %category, "skipping fact without usable content");
                skipped += 1;
            }
        }
    }

    (payloads, skipped)
}

fn recipe_body(date: &str, category: &str, record: &ContentRecord<Recipe>) -> Option<Value> {
    let content = match record.value() {
        Some(value) if value.is_object() => value.to_string(),
        _ => return None,
    };
    Some(json!({ "recipe": { "date": date, "content": content, "category": category } }))
}

fn fact_body(date: &str, category: &str, record: &ContentRecord<Fact>) -> Option<Value> {
    let Fact { fact, source, .. } = record.typed()?;
    Some(json!({
        "fact": { "date": date, "content": fact, "source": source, "category": category }
    }))
}

pub struct ContentPoster {
    client: reqwest::Client,
    base_url: String,
}

impl ContentPoster {
    pub fn new(base_url: &str) -> Result<Self, PostError> {
        if base_url.trim().is_empty() {
            return Err(PostError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn create_url(&self, kind: ContentKind) -> String {
        format!("{}/api/{}/create", self.base_url, kind.plural())
    }

    /// Sends one payload. Returns whether the server accepted it.
    pub async fn post<T: Serialize>(&self, kind: ContentKind, body: &T) -> Result<bool, PostError> {
        let url = self.create_url(kind);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, body = %error_text, "content server rejected post");
            return Ok(false);
        }

        debug!(url = %url, status = %status, "posted content");
        Ok(true)
    }

    /// Transport failures abort; per-item rejections are only counted.
    pub async fn post_batch(&self, batch: &DailyBatch) -> Result<PostSummary, PostError> {
        let (payloads, skipped) = payloads_for(batch);
        let mut summary = PostSummary {
            skipped,
            ..PostSummary::default()
        };

        for payload in &payloads {
            if self.post(payload.kind, &payload.body).await? {
                summary.accepted += 1;
            } else {
                summary.rejected += 1;
            }
        }

        info!(
            date = %batch.label,
            accepted = summary.accepted,
            rejected = summary.rejected,
            skipped = summary.skipped,
            "posted daily content"
        );
        Ok(summary)
    }

    pub async fn post_all(&self, batches: &[DailyBatch]) -> Result<PostSummary, PostError> {
        let mut total = PostSummary::default();
        for batch in batches {
            total.absorb(self.post_batch(batch).await?);
        }
        Ok(total)
    }
}
