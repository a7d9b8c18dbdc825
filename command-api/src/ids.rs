//! Request identifiers
//!
//! Every request is tagged with a TypeID of the form `req_<uuidv7>`. The
//! UUIDv7 suffix is time-ordered, so ids sort by arrival in logs.
//!
//! ```rust
//! use command_api::ids::RequestId;
//!
//! let id = RequestId::new();
//! assert!(id.as_str().starts_with("req_"));
//! ```

use http::Request;
use mti::prelude::*;
use std::fmt;
use std::str::FromStr;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Identifier attached to one HTTP request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    pub const PREFIX: &'static str = "req";

    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = RequestIdError;

    /// Parse an id received from a client or an upstream service
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mti = MagicTypeId::from_str(s).map_err(RequestIdError::Parse)?;
        let prefix = mti.prefix().as_str();
        if prefix != Self::PREFIX {
            return Err(RequestIdError::InvalidPrefix(prefix.to_string()));
        }
        Ok(Self(mti))
    }
}

/// Error parsing a [`RequestId`]
#[derive(Debug, thiserror::Error)]
pub enum RequestIdError {
    #[error("failed to parse request ID: {0}")]
    Parse(#[from] MagicTypeIdError),

    #[error("invalid request ID prefix '{0}', expected 'req'")]
    InvalidPrefix(String),
}

/// Generates a [`RequestId`] for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let header_value = http::HeaderValue::from_str(RequestId::new().as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_format() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
        // prefix (3) + underscore (1) + suffix (26)
        assert_eq!(id.as_str().len(), 30);
    }

    #[test]
    fn test_parse_round_trip() {
        let id = RequestId::new();
        let parsed = RequestId::from_str(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_other_prefix() {
        let err = RequestId::from_str("cmd_01h455vb4pex5vsknk084sn02q").unwrap_err();
        assert!(matches!(err, RequestIdError::InvalidPrefix(ref p) if p == "cmd"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RequestId::from_str("req_invalid").is_err());
    }

    #[test]
    fn test_make_typed_request_id() {
        let request = http::Request::builder().body(()).unwrap();
        let id = MakeTypedRequestId.make_request_id(&request).unwrap();
        assert!(id.header_value().to_str().unwrap().starts_with("req_"));
    }
}
