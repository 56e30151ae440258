//! Static allow-list CORS.
//!
//! When enabled, a request with an `Origin` header is either rejected outright
//! or answered with the origin echoed back and credentials allowed. `OPTIONS`
//! requests from allowed origins are answered here as preflights and never
//! reach an origin.

use cloudfauxnt_core::CorsConfig;
use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    CONTENT_TYPE, HeaderValue, ORIGIN, VARY,
};

use crate::body::CloudfauxntBody;

/// What the CORS layer decided for a request.
#[derive(Debug)]
pub enum CorsOutcome {
    /// CORS is disabled or the request has no `Origin`; continue untouched.
    Skip,
    /// The origin is allowed; continue and decorate the response.
    Allow(HeaderValue),
    /// Answer immediately with this response.
    Respond(http::Response<CloudfauxntBody>),
}

/// CORS policy built from the `cors` configuration section.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    enabled: bool,
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
    max_age: u32,
}

impl CorsPolicy {
    /// Build the policy from configuration.
    #[must_use]
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            enabled: config.enabled,
            allowed_origins: config.allowed_origins.clone(),
            allowed_methods: config.allowed_methods.clone(),
            allowed_headers: config.allowed_headers.clone(),
            max_age: config.max_age,
        }
    }

    /// Evaluate a request.
    pub fn evaluate(&self, parts: &http::request::Parts) -> CorsOutcome {
        if !self.enabled {
            return CorsOutcome::Skip;
        }
        let Some(origin) = parts.headers.get(ORIGIN).filter(|v| !v.is_empty()) else {
            return CorsOutcome::Skip;
        };

        let allowed = origin
            .to_str()
            .is_ok_and(|o| self.allowed_origins.iter().any(|p| match_origin(p, o)));
        if !allowed {
            return CorsOutcome::Respond(forbidden_origin_response());
        }

        if parts.method == http::Method::OPTIONS {
            let response = self.preflight_response(parts);
            return CorsOutcome::Respond(apply_allow_headers(response, origin.clone()));
        }
        CorsOutcome::Allow(origin.clone())
    }

    fn preflight_response(&self, parts: &http::request::Parts) -> http::Response<CloudfauxntBody> {
        let mut builder = http::Response::builder()
            .status(http::StatusCode::NO_CONTENT)
            .header(ACCESS_CONTROL_ALLOW_METHODS, self.allowed_methods.join(", "));

        if let Some(requested) = parts
            .headers
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .filter(|v| !v.is_empty())
        {
            if self.allowed_headers.iter().any(|h| h == "*") {
                builder = builder.header(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            } else {
                builder = builder.header(ACCESS_CONTROL_ALLOW_HEADERS, self.allowed_headers.join(", "));
            }
        }
        if self.max_age > 0 {
            builder = builder.header(ACCESS_CONTROL_MAX_AGE, self.max_age);
        }

        builder.body(CloudfauxntBody::empty()).unwrap_or_else(|e| {
            tracing::error!(error = %e, "invalid CORS preflight headers");
            let mut response = http::Response::new(CloudfauxntBody::empty());
            *response.status_mut() = http::StatusCode::NO_CONTENT;
            response
        })
    }
}

/// Add the headers an allowed cross-origin response carries.
pub fn apply_allow_headers(
    mut response: http::Response<CloudfauxntBody>,
    origin: HeaderValue,
) -> http::Response<CloudfauxntBody> {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    response
}

/// Check if an origin matches an allow-list pattern.
///
/// `*` matches everything and `*.example.com` matches any origin ending in
/// `.example.com`. Anything else must match exactly.
pub fn match_origin(pattern: &str, origin: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(domain) = pattern.strip_prefix('*').filter(|d| d.starts_with('.')) {
        return origin.ends_with(domain);
    }
    pattern == origin
}

fn forbidden_origin_response() -> http::Response<CloudfauxntBody> {
    http::Response::builder()
        .status(http::StatusCode::FORBIDDEN)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(CloudfauxntBody::generated("Origin not allowed\n"))
        .expect("static CORS rejection should be valid")
}
