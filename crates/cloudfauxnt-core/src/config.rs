//! YAML configuration model.
//!
//! [`CloudfauxntConfig`] mirrors the configuration file one-to-one. Loading it
//! applies defaults and validation in one step; the result is never mutated
//! again once the server starts.
//!
//! ```yaml
//! server:
//!   port: 9001
//!   host: 0.0.0.0
//! origins:
//!   - name: s3
//!     url: http://localhost:9000
//!     path_patterns: ["/s3/*"]
//!     strip_prefix: /s3
//!     require_signature: true
//! signing:
//!   enabled: false
//!   key_pair_id: APKAEXAMPLE
//!   public_key_path: keys/public.pem
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::origin::{OriginRule, SignatureRequirement};
use crate::signing::{SigningPolicy, load_public_key};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudfauxntConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Origins in match order.
    #[serde(default)]
    pub origins: Vec<OriginRule>,
    /// CORS allow-list.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Signature verification settings.
    #[serde(default)]
    pub signing: SigningConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP port, 1-65535.
    #[serde(default)]
    pub port: u32,
    /// Bind host; empty means `0.0.0.0`.
    #[serde(default)]
    pub host: String,
    /// Upstream request timeout; zero means 30 seconds.
    #[serde(default)]
    pub timeout_seconds: u64,
    /// Object served for root requests when the origin sets none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_root_object: Option<String>,
    /// Log level filter (e.g. `info`, `debug`); empty means `info`.
    #[serde(default)]
    pub log_level: String,
    /// Largest request body buffered for forwarding; zero means 10 MiB.
    #[serde(default)]
    pub max_body_bytes: u64,
}

/// CORS allow-list settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Whether CORS handling is active.
    #[serde(default)]
    pub enabled: bool,
    /// Allowed origins; supports `*` and `*.domain` wildcards.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Methods listed in preflight responses.
    #[serde(default)]
    pub allowed_methods: Vec<String>,
    /// Headers listed in preflight responses; `*` echoes the request.
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds.
    #[serde(default)]
    pub max_age: u32,
}

/// Signature verification settings as written in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Global default for origins that inherit the requirement.
    #[serde(default)]
    pub enabled: bool,
    /// The key pair id proofs must carry.
    #[serde(default)]
    pub key_pair_id: String,
    /// Path to the PEM-encoded RSA public key.
    #[serde(default)]
    pub public_key_path: String,
    /// Token tuning.
    #[serde(default)]
    pub token_options: TokenOptions,
}

/// Token tuning knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenOptions {
    /// Tolerance added to expiration checks.
    #[serde(default)]
    pub clock_skew_seconds: i64,
    /// TTL for signed URLs minted without an explicit expiration.
    #[serde(default)]
    pub default_url_ttl_seconds: i64,
    /// TTL for signed cookies minted without an explicit expiration.
    #[serde(default)]
    pub default_cookie_ttl_seconds: i64,
    /// Whether minted cookie policies may contain wildcard resources.
    #[serde(default)]
    pub allow_wildcard_patterns: bool,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CORS_MAX_AGE: u32 = 3600;
const DEFAULT_URL_TTL_SECONDS: i64 = 3600;
const DEFAULT_COOKIE_TTL_SECONDS: i64 = 86_400;

impl CloudfauxntConfig {
    /// Read, parse, default, and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable, not valid YAML, or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "read configuration file");
        Self::from_yaml_str(&text)
    }

    /// Parse, default, and validate configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the YAML is malformed or fails validation.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let mut config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply defaults and check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation found.
    pub fn validate(&mut self) -> ConfigResult<()> {
        let server = &mut self.server;
        if !(1..=65_535).contains(&server.port) {
            return Err(ConfigError::Invalid(format!(
                "invalid server port: {} (must be 1-65535)",
                server.port
            )));
        }
        if server.host.is_empty() {
            server.host = DEFAULT_HOST.to_owned();
        }
        if server.timeout_seconds == 0 {
            server.timeout_seconds = DEFAULT_TIMEOUT_SECONDS;
        }
        if server.max_body_bytes == 0 {
            server.max_body_bytes = DEFAULT_MAX_BODY_BYTES;
        }
        if server.log_level.is_empty() {
            server.log_level = DEFAULT_LOG_LEVEL.to_owned();
        }

        if self.origins.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one origin must be configured".to_owned(),
            ));
        }
        for (i, origin) in self.origins.iter().enumerate() {
            validate_origin(i, origin)?;
        }

        let cors = &mut self.cors;
        if cors.enabled {
            if cors.allowed_origins.is_empty() {
                cors.allowed_origins = vec!["*".to_owned()];
            }
            if cors.allowed_methods.is_empty() {
                cors.allowed_methods = ["GET", "HEAD", "OPTIONS"].map(String::from).to_vec();
            }
            if cors.allowed_headers.is_empty() {
                cors.allowed_headers = vec!["*".to_owned()];
            }
            if cors.max_age == 0 {
                cors.max_age = DEFAULT_CORS_MAX_AGE;
            }
        }

        if self.requires_public_key() {
            if self.signing.key_pair_id.is_empty() {
                return Err(ConfigError::Invalid(
                    "signing.key_pair_id is required when signatures are required".to_owned(),
                ));
            }
            if self.signing.public_key_path.is_empty() {
                return Err(ConfigError::Invalid(
                    "signing.public_key_path is required when signatures are required".to_owned(),
                ));
            }
        }

        let tokens = &mut self.signing.token_options;
        if tokens.clock_skew_seconds < 0 {
            return Err(ConfigError::Invalid(
                "signing.token_options.clock_skew_seconds must not be negative".to_owned(),
            ));
        }
        if tokens.default_url_ttl_seconds <= 0 {
            tokens.default_url_ttl_seconds = DEFAULT_URL_TTL_SECONDS;
        }
        if tokens.default_cookie_ttl_seconds <= 0 {
            tokens.default_cookie_ttl_seconds = DEFAULT_COOKIE_TTL_SECONDS;
        }

        Ok(())
    }

    /// Apply environment overrides (`GATEWAY_LISTEN`, `LOG_LEVEL`).
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `GATEWAY_LISTEN` is `host:port`; a value whose port does not parse is
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(listen) = lookup("GATEWAY_LISTEN") {
            if let Some((host, port)) = listen.rsplit_once(':') {
                if let Ok(port) = port.parse::<u16>() {
                    self.server.host = host.to_owned();
                    self.server.port = u32::from(port);
                }
            }
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.server.log_level = level;
        }
    }

    /// The `host:port` address to bind.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether any origin can end up requiring a signature.
    #[must_use]
    pub fn requires_public_key(&self) -> bool {
        self.signing.enabled
            || self
                .origins
                .iter()
                .any(|o| o.require_signature == SignatureRequirement::Require)
    }

    /// The signing policy without a public key: key pair id, skew, and the
    /// token defaults used when minting proofs.
    #[must_use]
    pub fn token_policy(&self) -> SigningPolicy {
        let tokens = &self.signing.token_options;
        SigningPolicy::builder()
            .enabled(self.signing.enabled)
            .key_pair_id(self.signing.key_pair_id.clone())
            .clock_skew_seconds(tokens.clock_skew_seconds)
            .default_url_ttl_seconds(tokens.default_url_ttl_seconds)
            .default_cookie_ttl_seconds(tokens.default_cookie_ttl_seconds)
            .allow_wildcard_patterns(tokens.allow_wildcard_patterns)
            .build()
    }

    /// Build the runtime signing policy, loading the public key if any origin
    /// may require a signature.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::KeyRead`] or [`ConfigError::Key`] if the key
    /// cannot be loaded.
    pub fn signing_policy(&self) -> ConfigResult<SigningPolicy> {
        let mut policy = self.token_policy();
        if self.requires_public_key() {
            policy.public_key = Some(load_public_key(&PathBuf::from(
                &self.signing.public_key_path,
            ))?);
        }
        Ok(policy)
    }
}

fn validate_origin(index: usize, origin: &OriginRule) -> ConfigResult<()> {
    if origin.name.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "origin {index}: name is required"
        )));
    }
    if origin.url.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "origin {}: URL is required",
            origin.name
        )));
    }
    let uri: http::Uri = origin.url.parse().map_err(|e| {
        ConfigError::Invalid(format!("origin {}: invalid URL: {e}", origin.name))
    })?;
    if !matches!(uri.scheme_str(), Some("http" | "https")) || uri.authority().is_none() {
        return Err(ConfigError::Invalid(format!(
            "origin {}: URL must be an absolute http(s) URL",
            origin.name
        )));
    }
    if origin.path_patterns.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "origin {}: at least one path pattern is required",
            origin.name
        )));
    }
    Ok(())
}
