//! Error bodies, health responses, and headers shared by every response.
//!
//! Error bodies mimic CloudFront's flat XML error format:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Error>
//!   <Code>AccessDenied</Code>
//!   <Message>Access denied</Message>
//!   <RequestId>5E1A9C...</RequestId>
//! </Error>
//! ```
//!
//! Messages are fixed per code. Detail about why a request failed only ever
//! reaches the logs.

use std::fmt;
use std::io;

use chrono::Utc;
use http::header::{CONTENT_TYPE, DATE, HeaderValue, SERVER, VIA};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use uuid::Uuid;

use crate::body::CloudfauxntBody;

/// Header carrying the request id on every response and forwarded request.
pub const CF_ID_HEADER: &str = "x-amz-cf-id";
/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "CloudFauxnt";
/// Value of the `Via` header on forwarded requests and responses.
pub const VIA_VALUE: &str = "1.1 cloudfauxnt";
/// Value of the `X-Cache` header on forwarded responses.
pub const X_CACHE_VALUE: &str = "Miss from cloudfauxnt";

/// Error codes this edge returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeErrorCode {
    /// No origin serves the requested path.
    NoSuchKey,
    /// The request needed a valid proof and did not have one.
    AccessDenied,
    /// The origin could not be reached or failed mid-response.
    BadGateway,
    /// The request body exceeds the configured limit.
    EntityTooLarge,
}

impl EdgeErrorCode {
    /// The `<Code>` element text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSuchKey => "NoSuchKey",
            Self::AccessDenied => "AccessDenied",
            Self::BadGateway => "BadGateway",
            Self::EntityTooLarge => "EntityTooLarge",
        }
    }

    /// The fixed `<Message>` element text.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoSuchKey => "The specified path does not match any configured origin",
            Self::AccessDenied => "Access denied",
            Self::BadGateway => "Failed to reach origin",
            Self::EntityTooLarge => "Request body exceeds the configured limit",
        }
    }

    /// The HTTP status for this code.
    #[must_use]
    pub fn status(self) -> http::StatusCode {
        match self {
            Self::NoSuchKey => http::StatusCode::NOT_FOUND,
            Self::AccessDenied => http::StatusCode::FORBIDDEN,
            Self::BadGateway => http::StatusCode::BAD_GATEWAY,
            Self::EntityTooLarge => http::StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl fmt::Display for EdgeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a request id: an uppercase hex v4 UUID without dashes.
#[must_use]
pub fn request_id() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

/// Format an error body as XML.
pub fn error_to_xml(code: &str, message: &str, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, code, message, request_id) {
        tracing::error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(buf: &mut Vec<u8>, code: &str, message: &str, request_id: &str) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(code))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(message))?;
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;

    Ok(())
}

/// Build the XML error response for `code`.
pub fn error_response(code: EdgeErrorCode, request_id: &str) -> http::Response<CloudfauxntBody> {
    let xml = error_to_xml(code.as_str(), code.message(), request_id);
    http::Response::builder()
        .status(code.status())
        .header(CONTENT_TYPE, "application/xml")
        .body(CloudfauxntBody::generated(xml))
        .expect("static error response should be valid")
}

/// Check if the request is a health check probe.
pub fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && path == "/health"
}

/// Produce a health check response.
pub fn health_check_response() -> http::Response<CloudfauxntBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(CloudfauxntBody::generated(
            r#"{"status":"healthy","service":"cloudfauxnt"}"#,
        ))
        .expect("static health response should be valid")
}

/// Current time formatted for the `Date` header.
#[must_use]
pub fn http_date() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Add the headers every response carries.
pub fn add_common_headers(
    mut response: http::Response<CloudfauxntBody>,
    request_id: &str,
) -> http::Response<CloudfauxntBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(CF_ID_HEADER, hv);
    }
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    if let Ok(hv) = HeaderValue::from_str(&http_date()) {
        headers.insert(DATE, hv);
    }

    response
}

/// Add the headers only forwarded responses carry.
pub fn add_forwarded_headers(
    mut response: http::Response<CloudfauxntBody>,
) -> http::Response<CloudfauxntBody> {
    let headers = response.headers_mut();
    headers.insert(VIA, HeaderValue::from_static(VIA_VALUE));
    headers.insert("x-cache", HeaderValue::from_static(X_CACHE_VALUE));
    response
}
