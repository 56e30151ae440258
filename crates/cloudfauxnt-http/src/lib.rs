//! HTTP layer for the CloudFauxnt edge.
//!
//! - **Service** ([`service`]): [`CloudfauxntService`](service::CloudfauxntService)
//!   implements hyper's `Service` trait and runs the request pipeline.
//! - **CORS** ([`cors`]): Static allow-list checks and preflight answers.
//! - **Forwarding** ([`proxy`]): The [`Forwarder`](proxy::Forwarder) seam,
//!   query and header cleanup, and the `reqwest`-backed
//!   [`HttpForwarder`](proxy::HttpForwarder).
//! - **Responses** ([`response`]): CloudFront-style XML errors, the health
//!   response, and headers common to every response.
//! - **Body** ([`body`]): The [`CloudfauxntBody`](body::CloudfauxntBody) type.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> CloudfauxntService (hyper Service)
//!     -> CORS allow-list / preflight
//!     -> Health check interception
//!     -> OriginTable::resolve            (404 NoSuchKey)
//!     -> Authorizer::authorize           (403 AccessDenied)
//!     -> forwarded_path + query cleanup
//!     -> Forwarder::forward              (502 BadGateway)
//!     -> Common response headers (X-Amz-Cf-Id, Server, Date)
//!   <- HTTP Response
//! ```

pub mod body;
pub mod cors;
pub mod proxy;
pub mod response;
pub mod service;

pub use body::CloudfauxntBody;
pub use cors::CorsPolicy;
#[cfg(feature = "http-origin")]
pub use proxy::HttpForwarder;
pub use proxy::{ForwardError, ForwardRequest, Forwarder};
pub use service::{CloudfauxntHttpConfig, CloudfauxntService};
