//! Skew-tolerant expiration checks.

use crate::error::AuthError;

/// Check that a proof expiring at `expires` is still valid at `now`.
///
/// A proof is expired only when `now > expires + skew_seconds`; a request at
/// exactly `expires + skew_seconds` is still accepted.
///
/// # Errors
///
/// Returns [`AuthError::ProofExpired`] once the tolerance has passed.
pub fn check_expiration(expires: i64, now: i64, skew_seconds: i64) -> Result<(), AuthError> {
    if now > expires.saturating_add(skew_seconds) {
        return Err(AuthError::ProofExpired { expires, now });
    }
    Ok(())
}
