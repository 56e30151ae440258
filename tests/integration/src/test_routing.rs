//! Routing, rewriting, and forwarding integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, dead_origin, get_json, spawn_edge, spawn_origin, standard_config};

    #[tokio::test]
    async fn test_should_report_health() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let resp = client()
            .get(format!("http://{edge}/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.text().await.unwrap(),
            r#"{"status":"healthy","service":"cloudfauxnt"}"#
        );
    }

    #[tokio::test]
    async fn test_should_return_no_such_key_for_unmatched_path() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, false)).await;

        let resp = client()
            .get(format!("http://{edge}/unknown/thing"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/xml"
        );
        assert!(resp.headers().contains_key("x-amz-cf-id"));
        let body = resp.text().await.unwrap();
        assert!(body.contains("<Code>NoSuchKey</Code>"));
    }

    #[tokio::test]
    async fn test_should_rewrite_path_for_origin() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, false)).await;

        let (status, echo) =
            get_json(&client(), &format!("http://{edge}/s3/dir/file.txt?v=1")).await;
        let echo = echo.unwrap();
        assert_eq!(status, 200);
        assert_eq!(echo["path"], "/bucket/dir/file.txt");
        assert_eq!(echo["query"], "v=1");
        assert_eq!(echo["via"], "1.1 cloudfauxnt");
        assert_eq!(echo["host"], origin.trim_start_matches("http://"));
        assert!(echo["cf_id"].is_string());
    }

    #[tokio::test]
    async fn test_should_apply_root_objects() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, false)).await;
        let client = client();

        let (_, echo) = get_json(&client, &format!("http://{edge}/s3/")).await;
        assert_eq!(echo.unwrap()["path"], "/bucket/index.html");

        let (_, echo) = get_json(&client, &format!("http://{edge}/")).await;
        assert_eq!(echo.unwrap()["path"], "/home.html");
    }

    #[tokio::test]
    async fn test_should_add_edge_headers_to_forwarded_response() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, false)).await;

        let resp = client()
            .get(format!("http://{edge}/public/a.txt"))
            .send()
            .await
            .unwrap();
        let headers = resp.headers();
        assert_eq!(headers.get("server").unwrap(), "CloudFauxnt");
        assert_eq!(headers.get("x-cache").unwrap(), "Miss from cloudfauxnt");
        assert_eq!(headers.get("via").unwrap(), "1.1 cloudfauxnt");
        assert!(headers.contains_key("date"));
    }

    #[tokio::test]
    async fn test_should_return_bad_gateway_for_unreachable_origin() {
        let origin = dead_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, false)).await;

        let resp = client()
            .get(format!("http://{edge}/public/a.txt"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
        assert!(resp.text().await.unwrap().contains("<Code>BadGateway</Code>"));
    }
}
