// Integration tests for the query-command endpoint and static file serving

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use stitch::server::{build_router, AppState};
    use stitch::titles::TitleStore;
    use stitch::upstream::types::ReviewItem;
    use stitch::upstream::Upstream;
    use tower::util::ServiceExt;

    #[derive(Default)]
    struct StubUpstream {
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Upstream for StubUpstream {
        async fn fetch_reviews(&self) -> Result<Vec<ReviewItem>> {
            if self.fail {
                anyhow::bail!("review feed HTTP 503 Service Unavailable");
            }
            Ok(vec![ReviewItem {
                title: "Portal 2 Review".to_string(),
                author: Some("Jane Doe".to_string()),
                published_date: None,
                description: "Cake.".to_string(),
                link: None,
                guid: None,
            }])
        }

        async fn search_app_ids(&self, query: &str) -> Result<Vec<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                anyhow::bail!("SteamDB search HTTP 500");
            }
            Ok(vec!["620".to_string(), "400".to_string()])
        }

        async fn app_details(&self, app_id: &str) -> Result<String> {
            Ok(format!(
                r#"{{"{}": {{"success": true, "data": {{"header_image": "h.jpg"}}}}}}"#,
                app_id
            ))
        }

        async fn search_streams(&self, _query: &str) -> Result<String> {
            Ok(r#"{"streams": []}"#.to_string())
        }
    }

    struct Fixture {
        app: Router,
        upstream: Arc<StubUpstream>,
        titles_path: PathBuf,
        base_dir: PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.titles_path);
            let _ = std::fs::remove_dir_all(&self.base_dir);
        }
    }

    fn fixture(name: &str, fail: bool) -> Fixture {
        let base = std::env::temp_dir().join(format!("stitch-server-{}-{}", name, std::process::id()));
        let static_dir = base.join("public");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>Stitch</h1>").unwrap();
        std::fs::write(static_dir.join("notes.xyz"), "raw").unwrap();
        let titles_path = base.join("titles.json");
        let _ = std::fs::remove_file(&titles_path);

        let upstream = Arc::new(StubUpstream {
            fail,
            ..Default::default()
        });
        let titles = TitleStore::load(&titles_path).unwrap();
        let state = AppState::new(upstream.clone(), titles, static_dir.clone());
        Fixture {
            app: build_router(state),
            upstream,
            titles_path,
            base_dir: base,
        }
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("response should be JSON")
    }

    #[tokio::test]
    async fn test_wake_returns_review_items() {
        let fx = fixture("wake", false);
        let (status, _, body) = get(&fx.app, "/?wake").await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body[0]["title"], "Portal 2 Review");
        assert_eq!(body[0]["author"], "Jane Doe");
        assert!(body[0].get("publishedDate").is_some());
    }

    #[tokio::test]
    async fn test_search_decodes_plus_separated_query() {
        let fx = fixture("search", false);
        let (status, _, body) = get(&fx.app, "/?search=Half+Life+2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!(["620", "400"]));
        assert_eq!(*fx.upstream.queries.lock().unwrap(), vec!["Half Life 2".to_string()]);
    }

    #[tokio::test]
    async fn test_steam_body_passes_through_as_json() {
        let fx = fixture("steam", false);
        let (status, content_type, body) = get(&fx.app, "/?steam=620").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(json(&body)["620"]["success"], true);
    }

    #[tokio::test]
    async fn test_correct_then_titles_round_trip() {
        let fx = fixture("correct", false);
        let (status, _, body) = get(&fx.app, "/?correct&old=Half&new=Half+Life+2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["ok"], true);

        let (status, _, body) = get(&fx.app, "/?titles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body),
            serde_json::json!([{ "old": "Half", "newTitle": "Half Life 2" }])
        );

        let reloaded = TitleStore::load(&fx.titles_path).unwrap();
        assert_eq!(reloaded.book().lookup("Half"), Some("Half Life 2"));
    }

    #[tokio::test]
    async fn test_correct_without_new_title_is_bad_request() {
        let fx = fixture("correct-bad", false);
        let (status, _, body) = get(&fx.app, "/?correct&old=Half").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json(&body)["error"].as_str().unwrap().contains("new"));
    }

    #[tokio::test]
    async fn test_unrecognized_params_only() {
        let fx = fixture("unknown", false);
        let (status, _, _) = get(&fx.app, "/?foo=bar").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let fx = fixture("failure", true);
        let (status, _, body) = get(&fx.app, "/?wake").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json(&body)["error"].as_str().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let fx = fixture("index", false);
        let (status, content_type, body) = get(&fx.app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(body, b"<h1>Stitch</h1>");
    }

    #[tokio::test]
    async fn test_unknown_extension_is_octet_stream() {
        let fx = fixture("octet", false);
        let (status, content_type, _) = get(&fx.app, "/notes.xyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn test_missing_and_escaping_paths_are_not_found() {
        let fx = fixture("missing", false);
        let (status, _, _) = get(&fx.app, "/nope.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = get(&fx.app, "/../titles.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
