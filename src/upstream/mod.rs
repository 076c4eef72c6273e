pub mod review_feed;
pub mod steamdb;
pub mod storefront;
pub mod twitch;
pub mod types;

use crate::config::UpstreamConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use review_feed::ReviewFeed;
use steamdb::SteamDbSearch;
use storefront::Storefront;
use twitch::TwitchSearch;
use types::ReviewItem;

/// The external sources the server proxies. Storefront and stream bodies are
/// passed through as raw JSON text.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch_reviews(&self) -> Result<Vec<ReviewItem>>;
    async fn search_app_ids(&self, query: &str) -> Result<Vec<String>>;
    async fn app_details(&self, app_id: &str) -> Result<String>;
    async fn search_streams(&self, query: &str) -> Result<String>;
}

/// Live upstream clients sharing one connection pool.
pub struct HttpUpstream {
    reviews: ReviewFeed,
    steamdb: SteamDbSearch,
    storefront: Storefront,
    twitch: TwitchSearch,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig, twitch_client_id: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .pool_max_idle_per_host(4)
            .build()
            .context("failed to build upstream HTTP client")?;

        Ok(Self {
            reviews: ReviewFeed::new(client.clone(), &config.rss_feed_url),
            steamdb: SteamDbSearch::new(client.clone(), &config.steamdb_search_url),
            storefront: Storefront::new(client.clone(), &config.storefront_url),
            twitch: TwitchSearch::new(client, &config.twitch_search_url, twitch_client_id),
        })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch_reviews(&self) -> Result<Vec<ReviewItem>> {
        self.reviews.fetch().await
    }

    async fn search_app_ids(&self, query: &str) -> Result<Vec<String>> {
        self.steamdb.search(query).await
    }

    async fn app_details(&self, app_id: &str) -> Result<String> {
        self.storefront.app_details(app_id).await
    }

    async fn search_streams(&self, query: &str) -> Result<String> {
        self.twitch.search_streams(query).await
    }
}
