// Integration tests for the HTTP gateway against a live in-process server

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::Arc;
    use stitch::client::{Gateway, HttpGateway};
    use stitch::config::ClientConfig;
    use stitch::error::StitchError;
    use stitch::server::{build_router, AppState};
    use stitch::titles::{TitleCorrection, TitleStore};
    use stitch::upstream::types::ReviewItem;
    use stitch::upstream::Upstream;
    use tokio::net::TcpListener;

    struct StubUpstream {
        fail: bool,
    }

    #[async_trait]
    impl Upstream for StubUpstream {
        async fn fetch_reviews(&self) -> Result<Vec<ReviewItem>> {
            Ok(vec![ReviewItem {
                title: "Portal 2 Review".to_string(),
                author: Some("Jane Doe".to_string()),
                published_date: None,
                description: "Cake.".to_string(),
                link: Some("http://example.com/portal-2".to_string()),
                guid: None,
            }])
        }

        async fn search_app_ids(&self, query: &str) -> Result<Vec<String>> {
            if self.fail {
                anyhow::bail!("SteamDB search HTTP 500 Internal Server Error");
            }
            match query {
                "Portal 2" => Ok(vec!["620".to_string()]),
                _ => Ok(Vec::new()),
            }
        }

        async fn app_details(&self, app_id: &str) -> Result<String> {
            Ok(match app_id {
                "620" => r#"{"620": {"success": true, "data": {
                    "header_image": "h.jpg",
                    "price_overview": {"final": 999},
                    "metacritic": {"score": 95}}}}"#
                    .to_string(),
                other => format!(r#"{{"{}": {{"success": false}}}}"#, other),
            })
        }

        async fn search_streams(&self, query: &str) -> Result<String> {
            Ok(match query {
                "Portal 2" => r#"{"streams": [{"_id": 7, "channel": {"name": "glados"},
                    "preview": {"medium": "m.jpg"}}]}"#
                    .to_string(),
                _ => "<html>maintenance</html>".to_string(),
            })
        }
    }

    struct Server {
        addr: SocketAddr,
        base_dir: PathBuf,
    }

    impl Drop for Server {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.base_dir);
        }
    }

    async fn spawn_server(name: &str, fail: bool) -> Server {
        let base_dir = std::env::temp_dir().join(format!("stitch-gateway-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&base_dir);
        std::fs::create_dir_all(&base_dir).unwrap();

        let titles = TitleStore::load(&base_dir.join("titles.json")).unwrap();
        let state = AppState::new(Arc::new(StubUpstream { fail }), titles, base_dir.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        Server { addr, base_dir }
    }

    fn gateway(addr: SocketAddr, timeout_ms: u64) -> HttpGateway {
        HttpGateway::new(&ClientConfig {
            server_url: format!("http://{}", addr),
            timeout_ms,
            max_rss_items: 10,
            max_stream_preview: 3,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_full_lookup_over_http() {
        let server = spawn_server("lookup", false).await;
        let gw = gateway(server.addr, 2000);

        let reviews = gw.fetch_reviews().await.unwrap();
        assert_eq!(reviews[0].title, "Portal 2 Review");
        assert_eq!(reviews[0].link.as_deref(), Some("http://example.com/portal-2"));

        assert_eq!(gw.resolve_game_id("Portal 2").await.unwrap(), vec!["620"]);
        assert!(gw.resolve_game_id("Half").await.unwrap().is_empty());

        let price = gw.fetch_price_score("620").await.unwrap();
        assert_eq!(price.price_cents, Some(999));
        assert_eq!(price.metacritic_score, Some(95));

        let streams = gw.fetch_streams("Portal 2").await.unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].id, "7");
        assert_eq!(streams[0].channel_name, "glados");
    }

    #[tokio::test]
    async fn test_correction_round_trip_encodes_query() {
        let server = spawn_server("correct", false).await;
        let gw = gateway(server.addr, 2000);

        assert!(gw.load_corrections().await.unwrap().is_empty());
        gw.record_correction("Tom & Jerry", "Tom & Jerry: 50% Off?")
            .await
            .unwrap();
        assert_eq!(
            gw.load_corrections().await.unwrap(),
            vec![TitleCorrection::new("Tom & Jerry", "Tom & Jerry: 50% Off?")]
        );
    }

    #[tokio::test]
    async fn test_bad_gateway_status_is_upstream_error() {
        let server = spawn_server("status", true).await;
        let gw = gateway(server.addr, 2000);

        match gw.resolve_game_id("Portal 2").await {
            Err(StitchError::Upstream { gateway, message }) => {
                assert_eq!(gateway, "search");
                assert!(message.contains("502"), "message: {}", message);
            }
            other => panic!("expected Upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unusable_bodies_fail_at_their_stage() {
        let server = spawn_server("bodies", false).await;
        let gw = gateway(server.addr, 2000);

        let err = gw.fetch_price_score("1").await.unwrap_err();
        assert!(matches!(err, StitchError::Upstream { gateway: "steam", .. }));

        let err = gw.fetch_streams("Nobody").await.unwrap_err();
        assert!(matches!(err, StitchError::Upstream { gateway: "kraken", .. }));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let gw = gateway(addr, 200);
        match gw.resolve_game_id("Portal 2").await {
            Err(StitchError::Upstream { gateway, message }) => {
                assert_eq!(gateway, "search");
                assert_eq!(message, "timed out");
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_upstream_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let gw = gateway(addr, 500);
        let err = gw.load_corrections().await.unwrap_err();
        assert!(matches!(err, StitchError::Upstream { gateway: "titles", .. }));
    }
}
