//! CORS integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, spawn_edge, spawn_origin, standard_config};

    fn cors_config(origin: &str) -> String {
        let mut yaml = standard_config(origin, origin, false);
        yaml.push_str(
            r#"
cors:
  enabled: true
  allowed_origins: ["http://app.test", "*.example.com"]
  allowed_methods: [GET, HEAD]
  allowed_headers: ["*"]
  max_age: 600
"#,
        );
        yaml
    }

    #[tokio::test]
    async fn test_should_reject_disallowed_origin() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&cors_config(&origin)).await;

        let resp = client()
            .get(format!("http://{edge}/public/a.txt"))
            .header("origin", "http://evil.test")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
        assert_eq!(resp.text().await.unwrap(), "Origin not allowed\n");
    }

    #[tokio::test]
    async fn test_should_echo_allowed_origin() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&cors_config(&origin)).await;

        let resp = client()
            .get(format!("http://{edge}/public/a.txt"))
            .header("origin", "https://cdn.example.com")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let headers = resp.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "https://cdn.example.com"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
        assert_eq!(headers.get("vary").unwrap(), "Origin");
    }

    #[tokio::test]
    async fn test_should_answer_preflight() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&cors_config(&origin)).await;

        let resp = client()
            .request(reqwest::Method::OPTIONS, format!("http://{edge}/s3/a.txt"))
            .header("origin", "http://app.test")
            .header("access-control-request-method", "GET")
            .header("access-control-request-headers", "range")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);
        let headers = resp.headers();
        assert_eq!(headers.get("access-control-allow-methods").unwrap(), "GET, HEAD");
        assert_eq!(headers.get("access-control-allow-headers").unwrap(), "range");
        assert_eq!(headers.get("access-control-max-age").unwrap(), "600");
    }

    #[tokio::test]
    async fn test_should_ignore_requests_without_origin() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&cors_config(&origin)).await;

        let resp = client()
            .get(format!("http://{edge}/public/a.txt"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(!resp.headers().contains_key("access-control-allow-origin"));
    }
}
