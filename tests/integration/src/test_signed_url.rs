//! Signed URL integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, get_json, now, signer, spawn_edge, spawn_origin, standard_config};

    #[tokio::test]
    async fn test_should_deny_unsigned_request() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let resp = client()
            .get(format!("http://{edge}/s3/a.txt"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
        let body = resp.text().await.unwrap();
        assert!(body.contains("<Code>AccessDenied</Code>"));
        assert!(body.contains("<Message>Access denied</Message>"));
    }

    #[tokio::test]
    async fn test_should_forward_valid_signed_url_without_proof_params() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let url = signer()
            .sign_url(&format!("http://{edge}/s3/a.txt?download=1"), now() + 300)
            .unwrap();
        let (status, echo) = get_json(&client(), &url).await;
        assert_eq!(status, 200);
        let echo = echo.unwrap();
        assert_eq!(echo["path"], "/bucket/a.txt");
        assert_eq!(echo["query"], "download=1");
    }

    #[tokio::test]
    async fn test_should_deny_expired_signed_url() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let url = signer()
            .sign_url(&format!("http://{edge}/s3/a.txt"), now() - 60)
            .unwrap();
        let (status, _) = get_json(&client(), &url).await;
        assert_eq!(status, 403);
    }

    #[tokio::test]
    async fn test_should_deny_signed_url_for_other_path() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let url = signer()
            .sign_url(&format!("http://{edge}/s3/a.txt"), now() + 300)
            .unwrap();
        let tampered = url.replace("/s3/a.txt", "/s3/b.txt");
        let (status, _) = get_json(&client(), &tampered).await;
        assert_eq!(status, 403);
    }

    #[tokio::test]
    async fn test_should_deny_signed_url_with_wrong_key_pair_id() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let url = signer()
            .sign_url(&format!("http://{edge}/s3/a.txt"), now() + 300)
            .unwrap()
            .replace(crate::KEY_PAIR_ID, "APKAOTHER");
        let (status, _) = get_json(&client(), &url).await;
        assert_eq!(status, 403);
    }

    #[tokio::test]
    async fn test_should_honor_per_origin_requirement() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, false)).await;
        let client = client();

        let (status, _) = get_json(&client, &format!("http://{edge}/s3/a.txt")).await;
        assert_eq!(status, 200, "inherits disabled global signing");

        let (status, _) = get_json(&client, &format!("http://{edge}/private/a.txt")).await;
        assert_eq!(status, 403, "origin requires signatures");

        let url = signer()
            .sign_url(&format!("http://{edge}/private/a.txt"), now() + 300)
            .unwrap();
        let (status, echo) = get_json(&client, &url).await;
        assert_eq!(status, 200);
        assert_eq!(echo.unwrap()["path"], "/private/a.txt");
    }

    #[tokio::test]
    async fn test_should_exempt_public_origin_when_signing_enabled() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let (status, _) = get_json(&client(), &format!("http://{edge}/public/a.txt")).await;
        assert_eq!(status, 200);
    }
}
