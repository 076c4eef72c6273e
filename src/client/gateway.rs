use crate::config::ClientConfig;
use crate::error::StitchError;
use crate::titles::TitleCorrection;
use crate::upstream::types::{PriceScore, ReviewItem, StreamPreview};
use crate::upstream::{storefront, twitch};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;

/// The calls the orchestrator makes. Every failure, timeouts included,
/// arrives as `StitchError::Upstream`.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch_reviews(&self) -> Result<Vec<ReviewItem>, StitchError>;
    /// Candidate app ids, best guess first. Empty means "no match".
    async fn resolve_game_id(&self, name: &str) -> Result<Vec<String>, StitchError>;
    async fn fetch_price_score(&self, app_id: &str) -> Result<PriceScore, StitchError>;
    async fn fetch_streams(&self, name: &str) -> Result<Vec<StreamPreview>, StitchError>;
    async fn record_correction(&self, old: &str, new: &str) -> Result<(), StitchError>;
    async fn load_corrections(&self) -> Result<Vec<TitleCorrection>, StitchError>;
}

/// Talks to a running stitch server.
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("failed to build client HTTP client")?;
        Ok(Self {
            client,
            base_url: format!("{}/", config.server_url.trim_end_matches('/')),
        })
    }

    async fn get_text(
        &self,
        gateway: &'static str,
        params: &[(&str, &str)],
    ) -> Result<String, StitchError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await
            .map_err(|e| request_error(gateway, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StitchError::upstream(gateway, format!("HTTP {}: {}", status, body)));
        }
        resp.text().await.map_err(|e| request_error(gateway, e))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        gateway: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T, StitchError> {
        let body = self.get_text(gateway, params).await?;
        serde_json::from_str(&body)
            .map_err(|e| StitchError::upstream(gateway, format!("bad JSON: {}", e)))
    }
}

fn request_error(gateway: &'static str, e: reqwest::Error) -> StitchError {
    if e.is_timeout() {
        StitchError::upstream(gateway, "timed out")
    } else {
        StitchError::upstream(gateway, e.to_string())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_reviews(&self) -> Result<Vec<ReviewItem>, StitchError> {
        self.get_json("wake", &[("wake", "")]).await
    }

    async fn resolve_game_id(&self, name: &str) -> Result<Vec<String>, StitchError> {
        self.get_json("search", &[("search", name)]).await
    }

    async fn fetch_price_score(&self, app_id: &str) -> Result<PriceScore, StitchError> {
        let body = self.get_text("steam", &[("steam", app_id)]).await?;
        storefront::parse_app_details(&body, app_id)
            .map_err(|e| StitchError::upstream("steam", format!("{:#}", e)))
    }

    async fn fetch_streams(&self, name: &str) -> Result<Vec<StreamPreview>, StitchError> {
        let body = self.get_text("kraken", &[("kraken", name)]).await?;
        twitch::parse_streams(&body).map_err(|e| StitchError::upstream("kraken", format!("{:#}", e)))
    }

    async fn record_correction(&self, old: &str, new: &str) -> Result<(), StitchError> {
        self.get_text("correct", &[("correct", ""), ("old", old), ("new", new)])
            .await
            .map(|_| ())
    }

    async fn load_corrections(&self) -> Result<Vec<TitleCorrection>, StitchError> {
        self.get_json("titles", &[("titles", "")]).await
    }
}
