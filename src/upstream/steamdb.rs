//! SteamDB app search, scraped from the HTML results page.
//!
//! There is no API for this; the search page lists matching apps in a
//! sortable table whose first linked cell is the app id. The match is a best
//! guess, the first row wins downstream.

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};

pub struct SteamDbSearch {
    client: Client,
    search_url: String,
}

impl SteamDbSearch {
    pub fn new(client: Client, search_url: &str) -> Self {
        Self {
            client,
            search_url: search_url.to_string(),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(&self.search_url)
            .query(&[("a", "app"), ("q", query), ("type", "1"), ("category", "0")])
            .send()
            .await
            .context("SteamDB search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("SteamDB search HTTP {}: {}", status, body);
        }

        let html = resp.text().await.context("SteamDB response read failed")?;
        let ids = parse_search_results(&html)?;
        tracing::debug!(query, count = ids.len(), "SteamDB search parsed");
        Ok(ids)
    }
}

/// Collect the trimmed text of every linked cell in the results table,
/// in document order.
pub fn parse_search_results(html: &str) -> Result<Vec<String>> {
    let rows = Selector::parse("#table-sortable tr")
        .map_err(|e| anyhow::anyhow!("bad row selector: {:?}", e))?;
    let links = Selector::parse("td a").map_err(|e| anyhow::anyhow!("bad link selector: {:?}", e))?;

    let document = Html::parse_document(html);
    let ids = document
        .select(&rows)
        .flat_map(|row| row.select(&links))
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_results_in_order() {
        let html = r#"
            <html><body>
            <table id="table-sortable">
              <thead><tr><th>AppID</th><th>Name</th></tr></thead>
              <tbody>
                <tr class="app"><td><a href="/app/220/"> 220 </a></td><td>Half-Life 2</td></tr>
                <tr class="app"><td><a href="/app/340/">340</a></td><td>Half-Life 2: Lost Coast</td></tr>
              </tbody>
            </table>
            </body></html>"#;
        let ids = parse_search_results(html).unwrap();
        assert_eq!(ids, vec!["220", "340"]);
    }

    #[test]
    fn test_parse_search_results_no_table() {
        let html = "<html><body><p>No apps found</p></body></html>";
        assert!(parse_search_results(html).unwrap().is_empty());
    }

    #[test]
    fn test_parse_search_results_ignores_other_tables() {
        let html = r#"
            <table id="other"><tr><td><a href="/x">999</a></td></tr></table>
            <table id="table-sortable"><tr><td><a href="/app/400/">400</a></td></tr></table>"#;
        assert_eq!(parse_search_results(html).unwrap(), vec!["400"]);
    }

    #[tokio::test]
    #[ignore]
    async fn steamdb_live_search() {
        let client = Client::builder().user_agent("request").build().unwrap();
        let search = SteamDbSearch::new(client, "https://steamdb.info/search/");
        match search.search("Portal").await {
            Ok(ids) => println!("SteamDB ids: {:?}", ids),
            Err(e) => println!("SteamDB error: {:#}", e),
        }
    }
}
