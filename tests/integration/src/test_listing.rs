//! Directory listing integration tests.

#[cfg(test)]
mod tests {
    use crate::{
        LISTING_BUCKET, LISTING_HOST, backend_client, cleanup_prefix, ensure_listing_bucket, put,
        site_get,
    };

    fn unique_prefix() -> String {
        format!("run-{}/", &uuid::Uuid::new_v4().to_string()[..8])
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_directory_without_index() {
        let client = backend_client();
        ensure_listing_bucket(&client).await;
        let prefix = unique_prefix();
        put(&client, LISTING_BUCKET, &format!("{prefix}a.txt"), "a", "text/plain").await;
        put(&client, LISTING_BUCKET, &format!("{prefix}sub/b.txt"), "b", "text/plain").await;

        let resp = site_get(LISTING_HOST, &format!("/{prefix}")).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("text/html; charset=utf-8")
        );
        let html = resp.text().await.expect("body");
        assert!(html.contains(&format!("Index of /{prefix}")));
        assert!(html.contains(&format!(r#"href="/{prefix}a.txt""#)));
        assert!(html.contains(&format!(r#"href="/{prefix}sub/""#)));
        assert!(!html.contains("b.txt"), "nested keys are collapsed");

        cleanup_prefix(&client, LISTING_BUCKET, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_prefer_index_over_listing() {
        let client = backend_client();
        ensure_listing_bucket(&client).await;
        let prefix = unique_prefix();
        put(&client, LISTING_BUCKET, &format!("{prefix}index.html"), "index", "text/html").await;
        put(&client, LISTING_BUCKET, &format!("{prefix}other.txt"), "o", "text/plain").await;

        let resp = site_get(LISTING_HOST, &format!("/{prefix}")).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "index");

        cleanup_prefix(&client, LISTING_BUCKET, &prefix).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_not_list_file_paths() {
        let client = backend_client();
        ensure_listing_bucket(&client).await;
        let prefix = unique_prefix();
        put(&client, LISTING_BUCKET, &format!("{prefix}x.txt"), "x", "text/plain").await;

        let dir = prefix.trim_end_matches('/');
        let resp = site_get(LISTING_HOST, &format!("/{dir}")).await;
        assert_eq!(resp.status(), 404);

        cleanup_prefix(&client, LISTING_BUCKET, &prefix).await;
    }
}
