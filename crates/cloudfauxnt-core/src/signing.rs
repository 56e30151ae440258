//! Global signing policy and RSA public key loading.

use std::path::Path;

use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};

/// Process-wide signing policy, immutable after startup.
///
/// Holds the parsed public key rather than its encoding, so verification never
/// touches the filesystem.
///
/// # Examples
///
/// ```
/// use cloudfauxnt_core::SigningPolicy;
///
/// let policy = SigningPolicy::builder()
///     .enabled(false)
///     .key_pair_id("APKAEXAMPLE".to_owned())
///     .build();
/// assert_eq!(policy.clock_skew_seconds, 0);
/// assert!(policy.public_key.is_none());
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SigningPolicy {
    /// Whether origins that inherit the requirement must be signed.
    #[builder(default = false)]
    pub enabled: bool,

    /// The key pair id every proof must name.
    #[builder(default)]
    pub key_pair_id: String,

    /// Public key used to verify signatures.
    #[builder(default)]
    pub public_key: Option<RsaPublicKey>,

    /// Seconds of tolerance added to every expiration check.
    #[builder(default = 0)]
    pub clock_skew_seconds: i64,

    /// Lifetime of signed URLs minted without an explicit expiration.
    #[builder(default = 3600)]
    pub default_url_ttl_seconds: i64,

    /// Lifetime of signed cookies minted without an explicit expiration.
    #[builder(default = 86_400)]
    pub default_cookie_ttl_seconds: i64,

    /// Whether minted cookie policies may use `*` in their resource.
    #[builder(default = false)]
    pub allow_wildcard_patterns: bool,
}

/// Parse an RSA public key from PEM text.
///
/// Accepts SubjectPublicKeyInfo (`BEGIN PUBLIC KEY`) and PKCS#1
/// (`BEGIN RSA PUBLIC KEY`) encodings.
///
/// # Errors
///
/// Returns [`ConfigError::Key`] if the text holds neither encoding of an RSA key.
pub fn parse_public_key_pem(pem: &str) -> ConfigResult<RsaPublicKey> {
    let pem = pem.trim();
    if pem.starts_with("-----BEGIN RSA PUBLIC KEY-----") {
        return RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| ConfigError::Key(e.to_string()));
    }
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| ConfigError::Key(e.to_string()))
}

/// Read and parse an RSA public key from a PEM file.
///
/// # Errors
///
/// Returns [`ConfigError::KeyRead`] if the file cannot be read, or
/// [`ConfigError::Key`] if it does not contain an RSA public key.
pub fn load_public_key(path: &Path) -> ConfigResult<RsaPublicKey> {
    let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_public_key_pem(&pem)
}
