//! CloudFront canned-policy signed URL and signed cookie verification.
//!
//! This crate decides whether a request routed to an origin may proceed. It
//! supports the two canned-policy proof formats CloudFront issues:
//!
//! - **Signed URLs** carry `Expires`, `Signature`, and `Key-Pair-Id` query
//!   parameters. The signed message is `{scheme}://{host}{path}?Expires={n}`.
//! - **Signed cookies** carry `CloudFront-Policy`, `CloudFront-Signature`, and
//!   `CloudFront-Key-Pair-Id`. The signed message is the decoded policy JSON.
//!
//! Both are RSA PKCS#1 v1.5 signatures over a SHA1 digest.
//!
//! # Usage
//!
//! ```rust
//! use cloudfauxnt_auth::{Authorizer, InboundRequest};
//! use cloudfauxnt_core::{OriginRule, SignatureRequirement, SigningPolicy};
//!
//! let authorizer = Authorizer::new(SigningPolicy::builder().enabled(true).build());
//! let public = OriginRule::new("public", "http://localhost:9000", ["/public/*"])
//!     .with_requirement(SignatureRequirement::Exempt);
//!
//! let request = InboundRequest::new("http", "localhost:9001", "/public/a.txt");
//! assert!(authorizer.authorize(&request, &public).is_allowed());
//! ```
//!
//! # Modules
//!
//! - [`authorize`] - Requirement resolution and the verification pipeline
//! - [`canonical`] - The canonical signed-URL message
//! - [`encoding`] - CloudFront's URL-safe base64 alphabet
//! - [`error`] - Denial taxonomy
//! - [`expiration`] - Skew-tolerant expiration checks
//! - [`extract`] - Proof extraction from query parameters and cookies
//! - [`policy`] - Canned policy documents
//! - [`signer`] - Minting signed URLs and cookies for local development
//! - [`verify`] - RSA-SHA1 signature verification

pub mod authorize;
pub mod canonical;
pub mod encoding;
pub mod error;
pub mod expiration;
pub mod extract;
pub mod policy;
pub mod signer;
pub mod verify;

pub use authorize::{Authorization, Authorizer, Grant};
pub use canonical::canned_url_message;
pub use error::{AuthError, DenialReason, SignError};
pub use expiration::check_expiration;
pub use extract::{InboundRequest, ProofMaterial, SignedCookieProof, SignedUrlProof, extract_proof};
pub use policy::CannedPolicy;
pub use signer::{SignedCookies, Signer};
pub use verify::verify_sha1_rsa;
