//! Try-files chain integration tests.

#[cfg(test)]
mod tests {
    use crate::{backend_client, cleanup_bucket, create_test_bucket, put, site_get, site_host, site_request};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_index_document() {
        let client = backend_client();
        let bucket = create_test_bucket(&client, "index").await;
        put(&client, &bucket, "index.html", "<h1>home</h1>", "text/html").await;
        put(&client, &bucket, "docs/index.html", "<h1>docs</h1>", "text/html").await;

        let resp = site_get(&site_host(&bucket), "/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/html")
        );
        assert!(resp.headers().contains_key("etag"));
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(resp.text().await.expect("body"), "<h1>home</h1>");

        let resp = site_get(&site_host(&bucket), "/docs/").await;
        assert_eq!(resp.text().await.expect("body"), "<h1>docs</h1>");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_ignore_port_and_case_in_host() {
        let client = backend_client();
        let bucket = create_test_bucket(&client, "host").await;
        put(&client, &bucket, "about.txt", "about", "text/plain").await;

        let host = format!("{}:8080", site_host(&bucket).to_ascii_uppercase());
        let resp = site_get(&host, "/about.txt").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "about");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_error_document_for_missing_key() {
        let client = backend_client();
        let bucket = create_test_bucket(&client, "errdoc").await;
        put(&client, &bucket, "404.html", "<h1>missing</h1>", "text/html").await;

        let resp = site_get(&site_host(&bucket), "/blog/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "<h1>missing</h1>");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_when_nothing_matches() {
        let client = backend_client();
        let bucket = create_test_bucket(&client, "empty").await;

        let resp = site_get(&site_host(&bucket), "/missing.html").await;
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.text().await.expect("body"), "not found");

        let resp = site_get(&site_host(&bucket), "/photos/").await;
        assert_eq!(resp.status(), 404, "listing is off for unconfigured buckets");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_pass_through_missing_bucket() {
        let resp = site_get(&site_host("site-does-not-exist-0000"), "/index.html").await;
        assert_eq!(resp.status(), 404);
        assert_ne!(resp.text().await.expect("body"), "not found");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_route_by_forwarded_host() {
        let client = backend_client();
        let bucket = create_test_bucket(&client, "fwd").await;
        put(&client, &bucket, "index.html", "forwarded", "text/html").await;

        let forwarded = site_host(&bucket);
        let resp = site_request(
            "proxy.internal",
            "/",
            &[("x-forwarded-host", forwarded.as_str())],
        )
        .await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "forwarded");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_decode_encoded_paths() {
        let client = backend_client();
        let bucket = create_test_bucket(&client, "enc").await;
        put(&client, &bucket, "my notes.txt", "notes", "text/plain").await;

        let resp = site_get(&site_host(&bucket), "/my%20notes.txt").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "notes");

        cleanup_bucket(&client, &bucket).await;
    }
}
