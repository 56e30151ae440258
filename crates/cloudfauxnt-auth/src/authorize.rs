//! Requirement resolution and the verification pipeline.

use chrono::Utc;
use cloudfauxnt_core::{OriginRule, SigningPolicy};
use rsa::RsaPublicKey;
use tracing::{debug, error};

use crate::canonical::canned_url_message;
use crate::error::{AuthError, DenialReason};
use crate::expiration::check_expiration;
use crate::extract::{InboundRequest, ProofMaterial, SignedCookieProof, SignedUrlProof, extract_proof};
use crate::policy::CannedPolicy;
use crate::verify::verify_sha1_rsa;

/// Why a request was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// The origin does not require a signature.
    NotRequired,
    /// A valid signed URL was presented.
    SignedUrl,
    /// Valid signed cookies were presented.
    SignedCookie,
}

/// The outcome of authorizing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Forward the request.
    Allowed(Grant),
    /// Reject the request with `403 AccessDenied`.
    Denied(AuthError),
}

impl Authorization {
    /// Whether the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    /// The coarse denial reason, if denied.
    #[must_use]
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Self::Allowed(_) => None,
            Self::Denied(err) => Some(err.reason()),
        }
    }
}

/// Verifies signed URLs and cookies against the global signing policy.
#[derive(Debug, Clone)]
pub struct Authorizer {
    policy: SigningPolicy,
}

impl Authorizer {
    /// Create an authorizer for the given policy.
    #[must_use]
    pub fn new(policy: SigningPolicy) -> Self {
        Self { policy }
    }

    /// The policy this authorizer enforces.
    #[must_use]
    pub fn policy(&self) -> &SigningPolicy {
        &self.policy
    }

    /// Whether requests routed to `rule` need a proof.
    #[must_use]
    pub fn requires_signature(&self, rule: &OriginRule) -> bool {
        rule.requires_signature(self.policy.enabled)
    }

    /// Authorize a request routed to `rule` at the current time.
    #[must_use]
    pub fn authorize(&self, request: &InboundRequest, rule: &OriginRule) -> Authorization {
        self.authorize_at(request, rule, Utc::now().timestamp())
    }

    /// Authorize a request routed to `rule` as of `now` (seconds since the epoch).
    #[must_use]
    pub fn authorize_at(
        &self,
        request: &InboundRequest,
        rule: &OriginRule,
        now: i64,
    ) -> Authorization {
        if !self.requires_signature(rule) {
            debug!(origin = %rule.name, "signature not required");
            return Authorization::Allowed(Grant::NotRequired);
        }
        match self.verify(request, now) {
            Ok(grant) => {
                debug!(origin = %rule.name, ?grant, "signature verified");
                Authorization::Allowed(grant)
            }
            Err(err) => Authorization::Denied(err),
        }
    }

    /// Verify whatever proof the request carries, regardless of requirement.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthError`] the proof fails with.
    pub fn verify(&self, request: &InboundRequest, now: i64) -> Result<Grant, AuthError> {
        match extract_proof(request)? {
            ProofMaterial::SignedUrl(proof) => {
                self.verify_signed_url(request, &proof, now)?;
                Ok(Grant::SignedUrl)
            }
            ProofMaterial::SignedCookie(proof) => {
                self.verify_signed_cookie(&proof, now)?;
                Ok(Grant::SignedCookie)
            }
        }
    }

    fn verify_signed_url(
        &self,
        request: &InboundRequest,
        proof: &SignedUrlProof,
        now: i64,
    ) -> Result<(), AuthError> {
        self.check_key_pair_id(&proof.key_pair_id)?;
        check_expiration(proof.expires, now, self.policy.clock_skew_seconds)?;

        let message = canned_url_message(
            &request.scheme,
            &request.host,
            &request.path,
            &proof.expires_raw,
        );
        verify_sha1_rsa(self.public_key()?, message.as_bytes(), &proof.signature)
    }

    fn verify_signed_cookie(&self, proof: &SignedCookieProof, now: i64) -> Result<(), AuthError> {
        self.check_key_pair_id(&proof.key_pair_id)?;
        verify_sha1_rsa(self.public_key()?, &proof.policy, &proof.signature)?;

        let policy = CannedPolicy::decode(&proof.policy)?;
        debug!(resource = ?policy.resource, expires = policy.expires, "cookie policy verified");
        check_expiration(policy.expires, now, self.policy.clock_skew_seconds)
    }

    fn check_key_pair_id(&self, key_pair_id: &str) -> Result<(), AuthError> {
        if key_pair_id != self.policy.key_pair_id {
            return Err(AuthError::WrongKeyPairId(key_pair_id.to_owned()));
        }
        Ok(())
    }

    fn public_key(&self) -> Result<&RsaPublicKey, AuthError> {
        self.policy.public_key.as_ref().ok_or_else(|| {
            error!("signature required but no public key is configured");
            AuthError::SignatureInvalid
        })
    }
}
