//! Request tracking middleware
//!
//! Tags each request with a request id (reusing one the client sent),
//! echoes it on the response, and masks credentials in traced headers.

use http::HeaderName;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::ids::MakeTypedRequestId;

/// Header used when the configured name is not a valid header name
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// Headers masked in request traces
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "x-api-key",
    "x-auth-token",
];

/// Parse the configured request id header name
pub fn request_id_header(name: &str) -> HeaderName {
    match HeaderName::try_from(name) {
        Ok(header) => header,
        Err(_) => {
            tracing::warn!(
                "Invalid request id header '{}', using {}",
                name,
                DEFAULT_REQUEST_ID_HEADER
            );
            HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER)
        }
    }
}

/// Generate a `req_` TypeID for requests without an id in `header`
pub fn request_id_layer(header: HeaderName) -> SetRequestIdLayer<MakeTypedRequestId> {
    SetRequestIdLayer::new(header, MakeTypedRequestId)
}

/// Copy the request id in `header` onto the response
pub fn request_id_propagation_layer(header: HeaderName) -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header)
}

pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(
        SENSITIVE_HEADERS.iter().copied().map(HeaderName::from_static),
    )
}
