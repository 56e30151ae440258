//! Denial taxonomy.
//!
//! Every way a required proof can fail is an [`AuthError`] variant. The
//! variants carry detail for logs; clients only ever see a generic
//! `AccessDenied`, so the coarse [`DenialReason`] is what operators filter on.

use std::fmt;

/// Why a request that needed a proof was denied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Neither a signed-URL nor a signed-cookie signal was present.
    #[error("no CloudFront signature found")]
    MissingProof,

    /// A proof was present but a field was absent, undecodable, or unparseable.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The proof names a key pair id other than the configured one.
    #[error("invalid key pair ID: {0}")]
    WrongKeyPairId(String),

    /// The RSA signature does not verify over the canonical message.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// The proof's expiration, plus clock skew tolerance, has passed.
    #[error("proof expired at {expires} (now {now})")]
    ProofExpired {
        /// Claimed expiration, seconds since the epoch.
        expires: i64,
        /// Verifier clock at the time of the check.
        now: i64,
    },
}

impl AuthError {
    /// Collapse the error into its coarse class.
    #[must_use]
    pub fn reason(&self) -> DenialReason {
        match self {
            Self::MissingProof => DenialReason::Missing,
            Self::MalformedProof(_) => DenialReason::Malformed,
            Self::WrongKeyPairId(_) => DenialReason::WrongKey,
            Self::SignatureInvalid => DenialReason::BadSignature,
            Self::ProofExpired { .. } => DenialReason::Expired,
        }
    }
}

/// Coarse classification of a denial, for logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// No proof at all.
    Missing,
    /// Proof could not be decoded or parsed.
    Malformed,
    /// Proof is past its expiration.
    Expired,
    /// Signature does not verify.
    BadSignature,
    /// Proof names the wrong key pair.
    WrongKey,
}

impl DenialReason {
    /// Stable lowercase tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::BadSignature => "bad-signature",
            Self::WrongKey => "wrong-key",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while minting signed URLs or cookies.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// The private key PEM could not be parsed.
    #[error("failed to parse private key: {0}")]
    InvalidKey(String),

    /// The RSA signing operation failed.
    #[error("failed to sign: {0}")]
    Signing(#[from] rsa::Error),

    /// The URL to sign has no scheme or host.
    #[error("URL must be absolute: {0}")]
    RelativeUrl(String),

    /// A cookie resource used `*` while wildcards are disabled.
    #[error("wildcard resources are not allowed: {0}")]
    WildcardNotAllowed(String),

    /// The policy document could not be serialized.
    #[error("failed to serialize policy: {0}")]
    Policy(#[from] serde_json::Error),
}
