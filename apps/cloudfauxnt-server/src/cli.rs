//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Local CloudFront edge: routes requests to origins and enforces signed URLs
/// and signed cookies.
#[derive(Parser, Debug)]
#[command(name = "cloudfauxnt-server", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "CLOUDFAUXNT_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Probe a running server's health endpoint and exit 0 if healthy.
    #[arg(long)]
    pub health_check: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a signed URL for local testing.
    SignUrl(SignUrlArgs),
    /// Print signed cookies for local testing.
    SignCookies(SignCookiesArgs),
}

/// Key material shared by the signing subcommands.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// PEM-encoded RSA private key (PKCS#8 or PKCS#1).
    #[arg(long)]
    pub private_key: PathBuf,

    /// Key pair id stamped on the proof; defaults to `signing.key_pair_id`.
    #[arg(long, env = "CLOUDFAUXNT_KEY_PAIR_ID")]
    pub key_pair_id: Option<String>,

    /// Absolute expiration, seconds since the epoch.
    #[arg(long, conflicts_with = "ttl")]
    pub expires: Option<i64>,

    /// Lifetime in seconds from now; defaults to the configured token lifetime.
    #[arg(long)]
    pub ttl: Option<i64>,
}

#[derive(Args, Debug)]
pub struct SignUrlArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Absolute URL to sign, e.g. `http://localhost:9001/s3/file.txt`.
    pub url: String,
}

#[derive(Args, Debug)]
pub struct SignCookiesArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Resource the cookies grant, e.g. `http://localhost:9001/s3/*`.
    pub resource: String,

    /// Allow `*` in the resource even if `allow_wildcard_patterns` is off.
    #[arg(long)]
    pub allow_wildcards: bool,
}
