//! CloudFauxnt Server - a local CloudFront edge for development.
//!
//! Routes requests to configured origins by longest path pattern, enforces
//! canned-policy signed URLs and signed cookies where required, and forwards
//! everything else untouched.
//!
//! # Usage
//!
//! ```text
//! cloudfauxnt-server --config config.yaml
//! cloudfauxnt-server sign-url --private-key private.pem --key-pair-id APKA... http://localhost:9001/s3/file.txt
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CLOUDFAUXNT_CONFIG` | `config.yaml` | Configuration file |
//! | `GATEWAY_LISTEN` | *(from config)* | Bind address override, `host:port` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod cli;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cloudfauxnt_auth::{SignedCookies, Signer};
use cloudfauxnt_core::{CloudfauxntConfig, SigningPolicy};
use cloudfauxnt_http::{CloudfauxntHttpConfig, CloudfauxntService, Forwarder, HttpForwarder};

use crate::cli::{Cli, Command, KeyArgs, SignCookiesArgs, SignUrlArgs};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Address probed by `--health-check` when no configuration is readable.
const DEFAULT_HEALTH_ADDR: &str = "127.0.0.1:9001";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `log_level` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load the configuration file and apply environment overrides.
fn load_config(cli: &Cli) -> Result<CloudfauxntConfig> {
    let mut config = CloudfauxntConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    config.apply_env();
    Ok(config)
}

/// Log the effective configuration.
fn log_startup(config: &CloudfauxntConfig) {
    info!(
        listen = %config.listen_addr(),
        timeout_seconds = config.server.timeout_seconds,
        signing_enabled = config.signing.enabled,
        key_pair_id = %config.signing.key_pair_id,
        cors_enabled = config.cors.enabled,
        version = VERSION,
        "starting CloudFauxnt",
    );
    for origin in &config.origins {
        info!(
            name = %origin.name,
            url = %origin.url,
            patterns = ?origin.path_patterns,
            require_signature = origin.requires_signature(config.signing.enabled),
            "configured origin",
        );
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve<F: Forwarder>(listener: TcpListener, service: CloudfauxntService<F>) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Request the health endpoint of a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"healthy\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

/// Address to probe for `--health-check`.
fn health_check_addr(cli: &Cli) -> String {
    load_config(cli).map_or_else(
        |_| DEFAULT_HEALTH_ADDR.to_owned(),
        |config| config.listen_addr().replace("0.0.0.0", "127.0.0.1"),
    )
}

/// Initialize stderr logging for the signing subcommands, keeping stdout for
/// the minted proof.
fn init_cli_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Token defaults for the signing subcommands, from the configuration file
/// when it loads.
fn token_policy(cli: &Cli) -> SigningPolicy {
    match load_config(cli) {
        Ok(config) => config.token_policy(),
        Err(e) => {
            warn!(error = %e, "using built-in token defaults");
            SigningPolicy::builder().build()
        }
    }
}

/// Build a signer from the shared key arguments and the token defaults.
fn build_signer(args: &KeyArgs, policy: &SigningPolicy) -> Result<Signer> {
    let key_pair_id = args
        .key_pair_id
        .clone()
        .or_else(|| Some(policy.key_pair_id.clone()).filter(|id| !id.is_empty()))
        .context("--key-pair-id is required when signing.key_pair_id is not configured")?;
    let pem = std::fs::read_to_string(&args.private_key)
        .with_context(|| format!("failed to read private key {}", args.private_key.display()))?;
    Ok(Signer::from_pem(&pem, key_pair_id)
        .context("invalid private key")?
        .with_policy(policy))
}

/// The explicit expiration from `--expires` or `--ttl`, if either was given.
fn explicit_expiration(args: &KeyArgs, now: i64) -> Option<i64> {
    args.expires
        .or_else(|| args.ttl.map(|ttl| now.saturating_add(ttl)))
}

fn mint_url(signer: &Signer, args: &SignUrlArgs, now: i64) -> Result<String> {
    let signed = match explicit_expiration(&args.key, now) {
        Some(expires) => signer.sign_url(&args.url, expires),
        None => signer.sign_url_from(&args.url, now),
    };
    signed.with_context(|| format!("failed to sign {}", args.url))
}

fn mint_cookies(signer: &Signer, args: &SignCookiesArgs, now: i64) -> Result<SignedCookies> {
    let signed = match explicit_expiration(&args.key, now) {
        Some(expires) => signer.sign_cookies(&args.resource, expires),
        None => signer.sign_cookies_from(&args.resource, now),
    };
    signed.with_context(|| format!("failed to sign cookies for {}", args.resource))
}

fn sign_url(cli: &Cli, args: &SignUrlArgs) -> Result<()> {
    let signer = build_signer(&args.key, &token_policy(cli))?;
    println!("{}", mint_url(&signer, args, chrono::Utc::now().timestamp())?);
    Ok(())
}

fn sign_cookies(cli: &Cli, args: &SignCookiesArgs) -> Result<()> {
    let mut policy = token_policy(cli);
    policy.allow_wildcard_patterns |= args.allow_wildcards;
    let signer = build_signer(&args.key, &policy)?;
    let cookies = mint_cookies(&signer, args, chrono::Utc::now().timestamp())?;
    println!("Cookie: {}", cookies.cookie_header());
    for header in cookies.set_cookie_headers("/") {
        println!("Set-Cookie: {header}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Command::SignUrl(args)) => {
            init_cli_tracing();
            return sign_url(&cli, args);
        }
        Some(Command::SignCookies(args)) => {
            init_cli_tracing();
            return sign_cookies(&cli, args);
        }
        None => {}
    }

    // Handle --health-check flag for Docker HEALTHCHECK.
    if cli.health_check {
        let addr = health_check_addr(&cli);
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = load_config(&cli)?;

    init_tracing(&config.server.log_level)?;
    log_startup(&config);

    let http_config =
        CloudfauxntHttpConfig::from_config(&config).context("failed to load signing key")?;
    let forwarder = HttpForwarder::new(Duration::from_secs(config.server.timeout_seconds))
        .context("failed to build origin client")?;
    let service = CloudfauxntService::new(forwarder, http_config);

    let listen = config.listen_addr();
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid bind address: {listen}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
