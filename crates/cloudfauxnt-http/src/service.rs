//! The edge HTTP service implementing hyper's `Service` trait.
//!
//! [`CloudfauxntService`] runs every request through a fixed pipeline:
//!
//! 1. CORS allow-list check and preflight answers
//! 2. Health check interception (`GET /health`)
//! 3. Origin resolution (`404 NoSuchKey` on a miss)
//! 4. Signature authorization (`403 AccessDenied` on denial)
//! 5. Path rewrite, proof parameter removal, and forwarding (`502 BadGateway`
//!    if the origin fails)
//! 6. Common response headers (`X-Amz-Cf-Id`, `Server`, `Date`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use cloudfauxnt_auth::{Authorization, Authorizer, InboundRequest};
use cloudfauxnt_core::{CloudfauxntConfig, ConfigResult, OriginTable, forwarded_path};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::service::Service;
use tracing::{debug, error, info, warn};

use crate::body::CloudfauxntBody;
use crate::cors::{CorsOutcome, CorsPolicy, apply_allow_headers};
use crate::proxy::{ForwardRequest, Forwarder, forward_headers, strip_signature_params, upstream_url};
use crate::response::{
    EdgeErrorCode, add_common_headers, add_forwarded_headers, error_response,
    health_check_response, is_health_check, request_id,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything the service needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct CloudfauxntHttpConfig {
    /// Origins in match order.
    pub origins: OriginTable,
    /// Signature verification.
    pub authorizer: Authorizer,
    /// CORS allow-list.
    pub cors: CorsPolicy,
    /// Server-wide default root object.
    pub default_root_object: Option<String>,
    /// Largest request body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl CloudfauxntHttpConfig {
    /// Build the service configuration from a validated file configuration,
    /// loading the public key if any origin may need it.
    ///
    /// # Errors
    ///
    /// Returns the key loading error from
    /// [`CloudfauxntConfig::signing_policy`].
    pub fn from_config(config: &CloudfauxntConfig) -> ConfigResult<Self> {
        Ok(Self {
            origins: OriginTable::new(config.origins.clone()),
            authorizer: Authorizer::new(config.signing_policy()?),
            cors: CorsPolicy::new(&config.cors),
            default_root_object: config
                .server
                .default_root_object
                .clone()
                .filter(|o| !o.is_empty()),
            max_body_bytes: usize::try_from(config.server.max_body_bytes).unwrap_or(usize::MAX),
        })
    }
}

/// The CloudFauxnt edge service.
///
/// # Type Parameters
///
/// - `F`: How requests reach origins, see [`Forwarder`].
#[derive(Debug)]
pub struct CloudfauxntService<F: Forwarder> {
    forwarder: Arc<F>,
    config: Arc<CloudfauxntHttpConfig>,
}

impl<F: Forwarder> CloudfauxntService<F> {
    /// Create a new service.
    #[must_use]
    pub fn new(forwarder: F, config: CloudfauxntHttpConfig) -> Self {
        Self {
            forwarder: Arc::new(forwarder),
            config: Arc::new(config),
        }
    }
}

impl<F: Forwarder> Clone for CloudfauxntService<F> {
    fn clone(&self) -> Self {
        Self {
            forwarder: Arc::clone(&self.forwarder),
            config: Arc::clone(&self.config),
        }
    }
}

impl<F, B> Service<http::Request<B>> for CloudfauxntService<F>
where
    F: Forwarder,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<CloudfauxntBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let forwarder = Arc::clone(&self.forwarder);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let request_id = request_id();
            let response = process_request(req, forwarder.as_ref(), &config, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

async fn process_request<F, B>(
    req: http::Request<B>,
    forwarder: &F,
    config: &CloudfauxntHttpConfig,
    request_id: &str,
) -> http::Response<CloudfauxntBody>
where
    F: Forwarder,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    debug!(method = %parts.method, uri = %parts.uri, request_id, "processing request");

    let allowed_origin = match config.cors.evaluate(&parts) {
        CorsOutcome::Skip => None,
        CorsOutcome::Allow(origin) => Some(origin),
        CorsOutcome::Respond(response) => {
            debug!(request_id, status = %response.status(), "answered by CORS");
            return response;
        }
    };

    let response = route_request(parts, body, forwarder, config, request_id).await;
    match allowed_origin {
        Some(origin) => apply_allow_headers(response, origin),
        None => response,
    }
}

async fn route_request<F, B>(
    parts: http::request::Parts,
    body: B,
    forwarder: &F,
    config: &CloudfauxntHttpConfig,
    request_id: &str,
) -> http::Response<CloudfauxntBody>
where
    F: Forwarder,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let path = parts.uri.path();

    if is_health_check(&parts.method, path) {
        return health_check_response();
    }

    let rule = match config.origins.resolve(path) {
        Ok(rule) => rule,
        Err(err) => {
            warn!(path, request_id, error = %err, "no origin matched");
            return error_response(EdgeErrorCode::NoSuchKey, request_id);
        }
    };

    let scheme = parts.uri.scheme_str().unwrap_or("http");
    let inbound = InboundRequest::from_parts(&parts, scheme);
    match config.authorizer.authorize(&inbound, rule) {
        Authorization::Allowed(grant) => {
            debug!(origin = %rule.name, path, ?grant, request_id, "request authorized");
        }
        Authorization::Denied(err) => {
            warn!(
                origin = %rule.name,
                path,
                reason = %err.reason(),
                detail = %err,
                request_id,
                "request denied"
            );
            return error_response(EdgeErrorCode::AccessDenied, request_id);
        }
    }

    let body = match Limited::new(body, config.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(origin = %rule.name, limit = config.max_body_bytes, request_id, "request body too large");
            return error_response(EdgeErrorCode::EntityTooLarge, request_id);
        }
        Err(e) => {
            error!(error = %e, request_id, "failed to read request body");
            return error_response(EdgeErrorCode::BadGateway, request_id);
        }
    };

    let target_path = forwarded_path(path, rule, config.default_root_object.as_deref());
    let query = parts.uri.query().and_then(strip_signature_params);
    let url = match upstream_url(&rule.url, &target_path, query.as_deref()) {
        Ok(url) => url,
        Err(err) => {
            error!(origin = %rule.name, error = %err, request_id, "cannot build origin URL");
            return error_response(EdgeErrorCode::BadGateway, request_id);
        }
    };

    let origin_host = rule
        .url
        .parse::<http::Uri>()
        .ok()
        .and_then(|u| u.authority().map(|a| a.as_str().to_owned()))
        .unwrap_or_default();
    let request = ForwardRequest {
        method: parts.method.clone(),
        url,
        headers: forward_headers(&parts.headers, &origin_host, request_id),
        body,
    };

    let method = request.method.clone();
    let url = request.url.clone();
    match forwarder.forward(request).await {
        Ok(response) => {
            info!(
                origin = %rule.name,
                %method,
                %url,
                status = %response.status(),
                request_id,
                "forwarded request"
            );
            add_forwarded_headers(response.map(CloudfauxntBody::relayed))
        }
        Err(err) => {
            error!(origin = %rule.name, %method, %url, error = %err, request_id, "origin request failed");
            error_response(EdgeErrorCode::BadGateway, request_id)
        }
    }
}
