//! End-to-end tests for the CloudFauxnt edge.
//!
//! Each test starts a stub origin and an edge on ephemeral ports in-process,
//! then talks to the edge over real HTTP with `reqwest`. The stub origin
//! answers every request with a JSON echo of what it received.
//!
//! ```text
//! cargo test -p cloudfauxnt-integration
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use bytes::Bytes;
use cloudfauxnt_auth::Signer;
use cloudfauxnt_core::CloudfauxntConfig;
use cloudfauxnt_http::{CloudfauxntHttpConfig, CloudfauxntService, HttpForwarder};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Key pair id the fixtures are configured with.
pub const KEY_PAIR_ID: &str = "APKAJEXAMPLE123456";

const PRIVATE_KEY_PEM: &str = include_str!("../../fixtures/keys/private_key.pem");

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Path of the fixture public key.
#[must_use]
pub fn public_key_path() -> String {
    format!(
        "{}/../fixtures/keys/public_key.pem",
        env!("CARGO_MANIFEST_DIR")
    )
}

/// Signer holding the fixture private key.
#[must_use]
pub fn signer() -> Signer {
    Signer::from_pem(PRIVATE_KEY_PEM, KEY_PAIR_ID).expect("fixture private key")
}

/// Current time in seconds since the epoch.
#[must_use]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// HTTP client that never follows redirects.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .expect("client")
}

async fn echo(req: http::Request<Incoming>) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let body = serde_json::json!({
        "method": req.method().as_str(),
        "path": req.uri().path(),
        "query": req.uri().query(),
        "host": header("host"),
        "via": header("via"),
        "cf_id": header("x-amz-cf-id"),
        "user_agent": header("user-agent"),
    });
    Ok(http::Response::builder()
        .header("content-type", "application/json")
        .header("server", "stub-origin")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("echo response"))
}

/// Start a stub origin that echoes each request as JSON; returns its base URL.
pub async fn spawn_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind origin");
    let addr = listener.local_addr().expect("origin addr");

    tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        while let Ok((stream, _)) = listener.accept().await {
            let conn = http
                .serve_connection(TokioIo::new(stream), hyper::service::service_fn(echo))
                .into_owned();
            tokio::spawn(async move {
                let _ = conn.await;
            });
        }
    });

    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn dead_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

/// Start an edge from YAML configuration; returns its address.
pub async fn spawn_edge(yaml: &str) -> SocketAddr {
    init_tracing();

    let config = CloudfauxntConfig::from_yaml_str(yaml).expect("valid configuration");
    let http_config = CloudfauxntHttpConfig::from_config(&config).expect("signing key");
    let forwarder = HttpForwarder::new(Duration::from_secs(5)).expect("forwarder");
    let service = CloudfauxntService::new(forwarder, http_config);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind edge");
    let addr = listener.local_addr().expect("edge addr");

    tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        while let Ok((stream, _)) = listener.accept().await {
            let conn = http
                .serve_connection(TokioIo::new(stream), service.clone())
                .into_owned();
            tokio::spawn(async move {
                let _ = conn.await;
            });
        }
    });

    addr
}

/// Configuration with an S3-style signed origin and a public origin.
#[must_use]
pub fn standard_config(s3_origin: &str, public_origin: &str, signing_enabled: bool) -> String {
    format!(
        r#"
server:
  port: 9001
  default_root_object: home.html
origins:
  - name: s3
    url: "{s3_origin}"
    path_patterns: ["/s3/*"]
    strip_prefix: /s3
    target_prefix: /bucket
    default_root_object: index.html
  - name: public
    url: "{public_origin}"
    path_patterns: ["/public/*", "/"]
    require_signature: false
  - name: private
    url: "{public_origin}"
    path_patterns: ["/private/*"]
    require_signature: true
signing:
  enabled: {signing_enabled}
  key_pair_id: {KEY_PAIR_ID}
  public_key_path: "{key}"
  token_options:
    clock_skew_seconds: 5
"#,
        key = public_key_path(),
    )
}

/// Fetch a URL and return the status and parsed JSON echo.
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
) -> (reqwest::StatusCode, Option<serde_json::Value>) {
    let resp = client.get(url).send().await.expect("request");
    let status = resp.status();
    let text = resp.text().await.expect("body");
    (status, serde_json::from_str(&text).ok())
}

mod test_cors;
mod test_routing;
mod test_signed_cookie;
mod test_signed_url;
