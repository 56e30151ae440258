//! Forwarding requests to origins.
//!
//! The service builds a [`ForwardRequest`] and hands it to a [`Forwarder`].
//! [`HttpForwarder`] is the real implementation; tests substitute their own.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HOST, HeaderMap, HeaderName, HeaderValue, VIA};

use crate::response::{CF_ID_HEADER, VIA_VALUE};

/// Query parameters that carry proof material and never reach an origin.
pub const SIGNATURE_QUERY_PARAMS: [&str; 4] = ["Signature", "Expires", "Key-Pair-Id", "Policy"];

/// Headers meaningful only for a single connection.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Errors raised while forwarding to an origin.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The origin URL could not be combined with the forwarded path.
    #[error("invalid origin URL {url}: {reason}")]
    InvalidOrigin {
        /// The configured origin URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// The origin did not answer within the configured timeout.
    #[error("origin timed out")]
    Timeout,

    /// The origin could not be reached or the exchange failed.
    #[error("origin request failed: {0}")]
    Upstream(String),
}

/// A request ready to be sent to an origin.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// Request method, unchanged.
    pub method: http::Method,
    /// Absolute origin URL including the rewritten path and cleaned query.
    pub url: String,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

/// Future returned by [`Forwarder::forward`].
pub type ForwardFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<Bytes>, ForwardError>> + Send>>;

/// Sends requests to origins.
///
/// Implementations must be cheap to share; the service holds one behind an
/// `Arc` for every connection.
pub trait Forwarder: Send + Sync + 'static {
    /// Send `request` and buffer the origin's response.
    fn forward(&self, request: ForwardRequest) -> ForwardFuture;
}

impl<T: Forwarder> Forwarder for std::sync::Arc<T> {
    fn forward(&self, request: ForwardRequest) -> ForwardFuture {
        T::forward(self, request)
    }
}

/// Join an origin base URL, a forwarded path, and an optional query.
///
/// The origin URL's own path is kept as a prefix, joined with a single slash.
///
/// # Errors
///
/// Returns [`ForwardError::InvalidOrigin`] if `origin_url` is not an absolute URL.
pub fn upstream_url(
    origin_url: &str,
    forwarded_path: &str,
    query: Option<&str>,
) -> Result<String, ForwardError> {
    let invalid = |reason: &str| ForwardError::InvalidOrigin {
        url: origin_url.to_owned(),
        reason: reason.to_owned(),
    };
    let uri: http::Uri = origin_url.parse().map_err(|_| invalid("not a URI"))?;
    let scheme = uri.scheme_str().ok_or_else(|| invalid("missing scheme"))?;
    let authority = uri.authority().ok_or_else(|| invalid("missing host"))?;

    let base = uri.path().trim_end_matches('/');
    let mut url = format!("{scheme}://{authority}{base}");
    if !forwarded_path.starts_with('/') {
        url.push('/');
    }
    url.push_str(forwarded_path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    Ok(url)
}

/// Remove proof parameters from a raw query string.
///
/// Returns `None` when nothing is left.
#[must_use]
pub fn strip_signature_params(query: &str) -> Option<String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut kept = 0usize;
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if SIGNATURE_QUERY_PARAMS.contains(&name.as_ref()) {
            continue;
        }
        serializer.append_pair(&name, &value);
        kept += 1;
    }
    (kept > 0).then(|| serializer.finish())
}

/// Build the headers sent to an origin from the inbound headers.
///
/// Hop-by-hop headers and `Content-Length` are dropped, `Host` is replaced with
/// the origin's authority, and `X-Amz-Cf-Id` and `Via` are added.
#[must_use]
pub fn forward_headers(inbound: &HeaderMap, origin_host: &str, request_id: &str) -> HeaderMap {
    let mut headers = inbound.clone();
    remove_hop_by_hop(&mut headers);
    headers.remove(CONTENT_LENGTH);

    headers.remove(HOST);
    if let Ok(hv) = HeaderValue::from_str(origin_host) {
        headers.insert(HOST, hv);
    }
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(CF_ID_HEADER, hv);
    }
    headers.insert(VIA, HeaderValue::from_static(VIA_VALUE));
    headers
}

/// Drop hop-by-hop headers, including any named by `Connection`.
pub fn remove_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(http::header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// [`Forwarder`] backed by a shared `reqwest` client.
#[cfg(feature = "http-origin")]
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

#[cfg(feature = "http-origin")]
impl HttpForwarder {
    /// Create a forwarder whose requests time out after `timeout`.
    ///
    /// Redirects are passed back to the client rather than followed, and
    /// system proxy settings are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::Client`] if the client cannot be built.
    pub fn new(timeout: std::time::Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| ForwardError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http-origin")]
impl Forwarder for HttpForwarder {
    fn forward(&self, request: ForwardRequest) -> ForwardFuture {
        let client = self.client.clone();
        Box::pin(async move {
            let response = client
                .request(request.method, &request.url)
                .headers(request.headers)
                .body(request.body)
                .send()
                .await
                .map_err(upstream_error)?;

            let status = response.status();
            let mut headers = response.headers().clone();
            let body = response.bytes().await.map_err(upstream_error)?;

            remove_hop_by_hop(&mut headers);
            let mut forwarded = http::Response::new(body);
            *forwarded.status_mut() = status;
            *forwarded.headers_mut() = headers;
            Ok(forwarded)
        })
    }
}

#[cfg(feature = "http-origin")]
fn upstream_error(err: reqwest::Error) -> ForwardError {
    if err.is_timeout() {
        ForwardError::Timeout
    } else {
        ForwardError::Upstream(err.to_string())
    }
}
