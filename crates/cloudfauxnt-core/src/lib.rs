//! Origin rules, configuration, routing, and path rewriting for CloudFauxnt.
//!
//! This crate holds the immutable configuration snapshot that every request
//! handler shares: the ordered list of [`OriginRule`]s, the global
//! [`SigningPolicy`], and the pure functions that work on them.
//!
//! - [`config`] - YAML configuration model, validation, and defaults
//! - [`origin`] - Origin rules and the per-rule signature requirement
//! - [`routing`] - Longest-pattern path-to-origin resolution
//! - [`rewrite`] - Forwarded path computation
//! - [`signing`] - Global signing policy and RSA public key loading
//! - [`error`] - Configuration error types

pub mod config;
pub mod error;
pub mod origin;
pub mod rewrite;
pub mod routing;
pub mod signing;

pub use config::{CloudfauxntConfig, CorsConfig, ServerConfig, SigningConfig, TokenOptions};
pub use error::{ConfigError, ConfigResult};
pub use origin::{OriginRule, SignatureRequirement};
pub use rewrite::forwarded_path;
pub use routing::{OriginTable, RouteNotFound, pattern_matches};
pub use signing::{SigningPolicy, parse_public_key_pem};
