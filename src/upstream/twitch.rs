//! Twitch stream search (kraken `search/streams`).

use super::types::StreamPreview;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

pub struct TwitchSearch {
    client: Client,
    search_url: String,
    client_id: Option<String>,
}

impl TwitchSearch {
    pub fn new(client: Client, search_url: &str, client_id: Option<String>) -> Self {
        Self {
            client,
            search_url: search_url.to_string(),
            client_id,
        }
    }

    pub async fn search_streams(&self, query: &str) -> Result<String> {
        let mut req = self
            .client
            .get(&self.search_url)
            .query(&[("query", query), ("type", "suggest")]);
        if let Some(ref id) = self.client_id {
            req = req.header("Client-ID", id);
        }

        let resp = req.send().await.context("Twitch search request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Twitch search HTTP {}: {}", status, body);
        }

        resp.text().await.context("Twitch response read failed")
    }
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    streams: Vec<KrakenStream>,
}

#[derive(Debug, Deserialize)]
struct KrakenStream {
    #[serde(rename = "_id", default)]
    id: serde_json::Value,
    #[serde(default)]
    channel: Option<KrakenChannel>,
    #[serde(default)]
    preview: Option<KrakenPreview>,
}

#[derive(Debug, Deserialize)]
struct KrakenChannel {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct KrakenPreview {
    #[serde(default)]
    medium: String,
}

/// Parse a stream search body into previews, in response order.
/// Streams without a preview image are dropped.
pub fn parse_streams(json: &str) -> Result<Vec<StreamPreview>> {
    let parsed: StreamsResponse =
        serde_json::from_str(json).context("failed to parse Twitch streams JSON")?;

    Ok(parsed
        .streams
        .into_iter()
        .filter_map(|s| {
            let preview = s.preview.filter(|p| !p.medium.is_empty())?;
            let id = match s.id {
                serde_json::Value::String(id) => id,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            Some(StreamPreview {
                id,
                channel_name: s.channel.map(|c| c.name).unwrap_or_default(),
                preview_image_url: preview.medium,
            })
        })
        .collect())
}
