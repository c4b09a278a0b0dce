//! Health endpoint and host routing integration tests.

#[cfg(test)]
mod tests {
    use crate::{server_url, site_get};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_healthy() {
        let resp = reqwest::get(format!("{}/_s3static/health", server_url()))
            .await
            .expect("health request");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("server").and_then(|v| v.to_str().ok()),
            Some("s3static")
        );

        let body: serde_json::Value = resp.json().await.expect("json body");
        assert_eq!(body["status"], "running");
        assert_eq!(body["service"], "s3static");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_for_unknown_host() {
        let resp = site_get("nobody.example.invalid", "/").await;
        assert_eq!(resp.status(), 404);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(resp.text().await.expect("body"), "not found");
    }
}
