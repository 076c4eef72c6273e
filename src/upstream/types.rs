use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One review from the feed, as served by the `wake` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
}

/// Storefront lookup result. Price and score are optional: free games have
/// no price overview and plenty of games have no metacritic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceScore {
    pub header_image_url: String,
    pub price_cents: Option<u32>,
    pub metacritic_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPreview {
    pub id: String,
    pub channel_name: String,
    pub preview_image_url: String,
}
