//! Signed cookie integration tests.

#[cfg(test)]
mod tests {
    use crate::{client, now, signer, spawn_edge, spawn_origin, standard_config};

    #[tokio::test]
    async fn test_should_forward_request_with_valid_cookies() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let cookies = signer()
            .sign_cookies(&format!("http://{edge}/s3/*"), now() + 300)
            .unwrap();
        let resp = client()
            .get(format!("http://{edge}/s3/a.txt"))
            .header("cookie", cookies.cookie_header())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_should_deny_expired_cookies() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let cookies = signer()
            .sign_cookies(&format!("http://{edge}/s3/*"), now() - 60)
            .unwrap();
        let resp = client()
            .get(format!("http://{edge}/s3/a.txt"))
            .header("cookie", cookies.cookie_header())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn test_should_deny_cookies_with_swapped_policy() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let signer = signer();
        let short = signer
            .sign_cookies(&format!("http://{edge}/s3/*"), now() + 300)
            .unwrap();
        let long = signer
            .sign_cookies(&format!("http://{edge}/s3/*"), now() + 86_400)
            .unwrap();
        let forged = format!(
            "CloudFront-Policy={}; CloudFront-Signature={}; CloudFront-Key-Pair-Id={}",
            long.policy, short.signature, short.key_pair_id
        );
        let resp = client()
            .get(format!("http://{edge}/s3/a.txt"))
            .header("cookie", forged)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn test_should_not_fall_back_to_cookies_for_bad_query_signature() {
        let origin = spawn_origin().await;
        let edge = spawn_edge(&standard_config(&origin, &origin, true)).await;

        let cookies = signer()
            .sign_cookies(&format!("http://{edge}/s3/*"), now() + 300)
            .unwrap();
        let resp = client()
            .get(format!("http://{edge}/s3/a.txt?Signature=bogus"))
            .header("cookie", cookies.cookie_header())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
    }
}
