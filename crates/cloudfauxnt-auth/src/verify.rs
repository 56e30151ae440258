//! RSA-SHA1 signature verification.

use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::error::AuthError;

/// Verify an RSA PKCS#1 v1.5 signature over the SHA1 digest of `message`.
///
/// # Errors
///
/// Returns [`AuthError::SignatureInvalid`] if the signature does not verify.
pub fn verify_sha1_rsa(
    key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), AuthError> {
    let digest = Sha1::digest(message);
    key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature)
        .map_err(|e| {
            debug!(error = %e, "RSA-SHA1 verification failed");
            AuthError::SignatureInvalid
        })
}
