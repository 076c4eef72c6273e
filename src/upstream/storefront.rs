//! Steam storefront `appdetails` lookup.
//!
//! The server passes the storefront body through untouched; the client turns
//! it into a `PriceScore` with `parse_app_details`.

use super::types::PriceScore;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

const FILTERS: &str = "price_overview,metacritic,basic";

pub struct Storefront {
    client: Client,
    appdetails_url: String,
}

impl Storefront {
    pub fn new(client: Client, appdetails_url: &str) -> Self {
        Self {
            client,
            appdetails_url: appdetails_url.to_string(),
        }
    }

    pub async fn app_details(&self, app_id: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.appdetails_url)
            .query(&[("appids", app_id), ("filters", FILTERS)])
            .send()
            .await
            .context("storefront request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("storefront HTTP {} for app {}: {}", status, app_id, body);
        }

        resp.text().await.context("storefront response read failed")
    }
}

// ── appdetails JSON ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AppDetailsEntry {
    #[serde(default)]
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    #[serde(default)]
    header_image: String,
    price_overview: Option<PriceOverview>,
    metacritic: Option<Metacritic>,
}

#[derive(Debug, Deserialize)]
struct PriceOverview {
    #[serde(rename = "final")]
    final_cents: u32,
}

#[derive(Debug, Deserialize)]
struct Metacritic {
    score: u32,
}

/// Pull header image, price, and metacritic score for `app_id` out of an
/// appdetails body. Missing price or score is a valid partial result; a
/// missing or unsuccessful app entry is not.
pub fn parse_app_details(json: &str, app_id: &str) -> Result<PriceScore> {
    let mut entries: HashMap<String, AppDetailsEntry> =
        serde_json::from_str(json).context("failed to parse appdetails JSON")?;

    let entry = entries
        .remove(app_id)
        .with_context(|| format!("appdetails has no entry for app {}", app_id))?;
    if !entry.success {
        anyhow::bail!("storefront reported failure for app {}", app_id);
    }
    let data = entry
        .data
        .with_context(|| format!("appdetails entry for app {} has no data", app_id))?;

    Ok(PriceScore {
        header_image_url: data.header_image,
        price_cents: data.price_overview.map(|p| p.final_cents),
        metacritic_score: data.metacritic.map(|m| m.score),
    })
}
