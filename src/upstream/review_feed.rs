//! Review feed: an RSS 2.0 channel of PC game reviews.

use super::types::ReviewItem;
use anyhow::{Context, Result};
use reqwest::Client;

pub struct ReviewFeed {
    client: Client,
    url: String,
}

impl ReviewFeed {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }

    pub async fn fetch(&self) -> Result<Vec<ReviewItem>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("review feed request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("review feed HTTP {}: {}", status, body);
        }

        let bytes = resp.bytes().await.context("review feed read failed")?;
        let items = parse_review_feed(&bytes)?;
        tracing::debug!(count = items.len(), "review feed parsed");
        Ok(items)
    }
}

/// Parse an RSS document into review items, in feed order.
/// Items without a title are skipped.
pub fn parse_review_feed(xml: &[u8]) -> Result<Vec<ReviewItem>> {
    let channel = rss::Channel::read_from(xml).context("failed to parse review feed RSS")?;

    let items = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim().to_string();
            let author = item
                .author()
                .map(str::to_string)
                .or_else(|| {
                    item.dublin_core_ext()
                        .and_then(|dc| dc.creators().first().cloned())
                });
            let published_date = item
                .pub_date()
                .and_then(|d| chrono::DateTime::parse_from_rfc2822(d).ok())
                .map(|d| d.with_timezone(&chrono::Utc));

            Some(ReviewItem {
                title,
                author,
                published_date,
                description: item.description().unwrap_or_default().to_string(),
                link: item.link().map(str::to_string),
                guid: item.guid().map(|g| g.value().to_string()),
            })
        })
        .collect();

    Ok(items)
}
