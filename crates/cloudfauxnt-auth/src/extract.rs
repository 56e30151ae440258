//! Proof extraction from query parameters and cookies.
//!
//! Extraction decides which proof form a request carries and decodes it, but
//! checks nothing about key ids, expirations, or signatures. A request with a
//! `Signature` query parameter is committed to the signed-URL form; cookies are
//! only consulted when that parameter is absent.

use std::collections::HashMap;

use http::header::{COOKIE, HOST};
use http::request::Parts;

use crate::encoding::decode_cloudfront_base64;
use crate::error::AuthError;

/// Query parameter carrying a signed URL's signature.
pub const QUERY_SIGNATURE: &str = "Signature";
/// Query parameter carrying a signed URL's expiration.
pub const QUERY_EXPIRES: &str = "Expires";
/// Query parameter carrying a signed URL's key pair id.
pub const QUERY_KEY_PAIR_ID: &str = "Key-Pair-Id";
/// Query parameter carrying a custom policy. Recognized only so it can be
/// stripped before forwarding.
pub const QUERY_POLICY: &str = "Policy";

/// Cookie carrying the encoded canned policy.
pub const COOKIE_POLICY: &str = "CloudFront-Policy";
/// Cookie carrying the encoded signature.
pub const COOKIE_SIGNATURE: &str = "CloudFront-Signature";
/// Cookie carrying the key pair id.
pub const COOKIE_KEY_PAIR_ID: &str = "CloudFront-Key-Pair-Id";

/// The request attributes verification reads.
///
/// `path` is the path exactly as received, without percent-decoding. Query
/// parameters and cookies keep the first value when a name repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    /// `http` or `https`.
    pub scheme: String,
    /// Host header value, including any port.
    pub host: String,
    /// Request path as received.
    pub path: String,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    /// Cookies by name.
    pub cookies: HashMap<String, String>,
}

impl InboundRequest {
    /// Create a request with no query parameters or cookies.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a query parameter, keeping an existing value for the same name.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_insert_with(|| value.into());
        self
    }

    /// Add a cookie, keeping an existing value for the same name.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.entry(name.into()).or_insert_with(|| value.into());
        self
    }

    /// Add every parameter of a raw query string.
    #[must_use]
    pub fn with_query_string(mut self, raw: &str) -> Self {
        for (name, value) in form_urlencoded::parse(raw.as_bytes()) {
            self.query
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        self
    }

    /// Add every cookie of a `Cookie` header value.
    #[must_use]
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            self.cookies
                .entry(name.to_owned())
                .or_insert_with(|| value.to_owned());
        }
        self
    }

    /// Build from HTTP request parts.
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority for HTTP/2 requests.
    #[must_use]
    pub fn from_parts(parts: &Parts, scheme: &str) -> Self {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_owned()))
            .unwrap_or_default();

        let mut request = Self::new(scheme, host, parts.uri.path());
        if let Some(query) = parts.uri.query() {
            request = request.with_query_string(query);
        }
        for header in parts.headers.get_all(COOKIE) {
            if let Ok(value) = header.to_str() {
                request = request.with_cookie_header(value);
            }
        }
        request
    }
}

/// A decoded signed-URL proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlProof {
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// Parsed expiration, seconds since the epoch.
    pub expires: i64,
    /// `Expires` exactly as received, for the canonical message.
    pub expires_raw: String,
    /// Claimed key pair id.
    pub key_pair_id: String,
}

/// A decoded signed-cookie proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCookieProof {
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// Decoded policy JSON; this is the signed message.
    pub policy: Vec<u8>,
    /// Claimed key pair id.
    pub key_pair_id: String,
}

/// The proof a request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofMaterial {
    /// Signed URL query parameters.
    SignedUrl(SignedUrlProof),
    /// Signed cookies.
    SignedCookie(SignedCookieProof),
}

/// Extract and decode the proof a request carries.
///
/// # Errors
///
/// Returns [`AuthError::MissingProof`] when neither form's signal is present,
/// and [`AuthError::MalformedProof`] when the chosen form is incomplete or
/// cannot be decoded.
pub fn extract_proof(request: &InboundRequest) -> Result<ProofMaterial, AuthError> {
    if request.query.contains_key(QUERY_SIGNATURE) {
        return extract_signed_url(request).map(ProofMaterial::SignedUrl);
    }
    if request.cookies.contains_key(COOKIE_SIGNATURE) {
        return extract_signed_cookie(request).map(ProofMaterial::SignedCookie);
    }
    Err(AuthError::MissingProof)
}

fn extract_signed_url(request: &InboundRequest) -> Result<SignedUrlProof, AuthError> {
    let signature = non_empty(&request.query, QUERY_SIGNATURE)?;
    let expires_raw = non_empty(&request.query, QUERY_EXPIRES)?;
    let key_pair_id = non_empty(&request.query, QUERY_KEY_PAIR_ID)?;

    let expires = expires_raw
        .parse::<i64>()
        .map_err(|_| AuthError::MalformedProof(format!("invalid Expires value: {expires_raw}")))?;

    // A literal `+` that was not percent-encoded arrives as a space.
    let signature = decode_cloudfront_base64(&signature.replace(' ', "+"))
        .map_err(|e| AuthError::MalformedProof(format!("invalid signature encoding: {e}")))?;

    Ok(SignedUrlProof {
        signature,
        expires,
        expires_raw: expires_raw.to_owned(),
        key_pair_id: key_pair_id.to_owned(),
    })
}

fn extract_signed_cookie(request: &InboundRequest) -> Result<SignedCookieProof, AuthError> {
    let policy = non_empty(&request.cookies, COOKIE_POLICY)?;
    let signature = non_empty(&request.cookies, COOKIE_SIGNATURE)?;
    let key_pair_id = non_empty(&request.cookies, COOKIE_KEY_PAIR_ID)?;

    let policy = decode_cloudfront_base64(policy)
        .map_err(|e| AuthError::MalformedProof(format!("invalid policy encoding: {e}")))?;
    let signature = decode_cloudfront_base64(signature)
        .map_err(|e| AuthError::MalformedProof(format!("invalid signature encoding: {e}")))?;

    Ok(SignedCookieProof {
        signature,
        policy,
        key_pair_id: key_pair_id.to_owned(),
    })
}

fn non_empty<'a>(values: &'a HashMap<String, String>, name: &str) -> Result<&'a str, AuthError> {
    match values.get(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AuthError::MalformedProof(format!("missing {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_should_read_request_parts() {
        let parts = parts(
            "/s3/a.txt?Expires=10&x=1&x=2",
            &[
                ("host", "localhost:9001"),
                ("cookie", "a=1; CloudFront-Key-Pair-Id=\"K1\""),
                ("cookie", "a=2; b=3"),
            ],
        );
        let request = InboundRequest::from_parts(&parts, "http");
        assert_eq!(request.host, "localhost:9001");
        assert_eq!(request.path, "/s3/a.txt");
        assert_eq!(request.query["Expires"], "10");
        assert_eq!(request.query["x"], "1");
        assert_eq!(request.cookies["a"], "1");
        assert_eq!(request.cookies["b"], "3");
        assert_eq!(request.cookies[COOKIE_KEY_PAIR_ID], "K1");
    }

    #[test]
    fn test_should_fall_back_to_uri_authority() {
        let parts = parts("http://cdn.local:8080/x", &[]);
        let request = InboundRequest::from_parts(&parts, "http");
        assert_eq!(request.host, "cdn.local:8080");
    }

    #[test]
    fn test_should_report_missing_proof() {
        let request = InboundRequest::new("http", "h", "/p").with_query("other", "1");
        assert_eq!(extract_proof(&request), Err(AuthError::MissingProof));
    }

    #[test]
    fn test_should_extract_signed_url() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_query(QUERY_SIGNATURE, "-_8~")
            .with_query(QUERY_EXPIRES, "0100")
            .with_query(QUERY_KEY_PAIR_ID, "K1");
        let ProofMaterial::SignedUrl(proof) = extract_proof(&request).unwrap() else {
            panic!("expected signed URL proof");
        };
        assert_eq!(proof.signature, vec![0xfb, 0xff]);
        assert_eq!(proof.expires, 100);
        assert_eq!(proof.expires_raw, "0100");
        assert_eq!(proof.key_pair_id, "K1");
    }

    #[test]
    fn test_should_restore_plus_from_space() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_query_string("Signature=+/8=&Expires=1&Key-Pair-Id=K");
        let ProofMaterial::SignedUrl(proof) = extract_proof(&request).unwrap() else {
            panic!("expected signed URL proof");
        };
        assert_eq!(proof.signature, vec![0xfb, 0xff]);
    }

    #[test]
    fn test_should_reject_incomplete_signed_url() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_query(QUERY_SIGNATURE, "abcd")
            .with_query(QUERY_KEY_PAIR_ID, "K1");
        assert!(matches!(
            extract_proof(&request),
            Err(AuthError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_should_reject_non_numeric_expires() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_query(QUERY_SIGNATURE, "abcd")
            .with_query(QUERY_EXPIRES, "tomorrow")
            .with_query(QUERY_KEY_PAIR_ID, "K1");
        assert!(matches!(
            extract_proof(&request),
            Err(AuthError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_should_not_fall_back_to_cookies_when_query_signal_present() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_query(QUERY_SIGNATURE, "")
            .with_cookie(COOKIE_POLICY, "e30~")
            .with_cookie(COOKIE_SIGNATURE, "-_8~")
            .with_cookie(COOKIE_KEY_PAIR_ID, "K1");
        assert!(matches!(
            extract_proof(&request),
            Err(AuthError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_should_extract_signed_cookie() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_cookie(COOKIE_POLICY, "e30~")
            .with_cookie(COOKIE_SIGNATURE, "-_8~")
            .with_cookie(COOKIE_KEY_PAIR_ID, "K1");
        let ProofMaterial::SignedCookie(proof) = extract_proof(&request).unwrap() else {
            panic!("expected signed cookie proof");
        };
        assert_eq!(proof.policy, b"{}".to_vec());
        assert_eq!(proof.signature, vec![0xfb, 0xff]);
        assert_eq!(proof.key_pair_id, "K1");
    }

    #[test]
    fn test_should_reject_cookie_without_policy() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_cookie(COOKIE_SIGNATURE, "-_8~")
            .with_cookie(COOKIE_KEY_PAIR_ID, "K1");
        assert!(matches!(
            extract_proof(&request),
            Err(AuthError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_should_reject_undecodable_cookie_signature() {
        let request = InboundRequest::new("http", "h", "/p")
            .with_cookie(COOKIE_POLICY, "e30~")
            .with_cookie(COOKIE_SIGNATURE, "!!!")
            .with_cookie(COOKIE_KEY_PAIR_ID, "K1");
        assert!(matches!(
            extract_proof(&request),
            Err(AuthError::MalformedProof(_))
        ));
    }
}
