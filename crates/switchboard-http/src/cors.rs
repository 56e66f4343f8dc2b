//! CORS (Cross-Origin Resource Sharing) support

use hyper::HeaderMap;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, HeaderValue, InvalidHeaderValue,
};

/// CORS layer for adding appropriate headers
#[derive(Debug, Clone)]
pub struct CorsLayer {
    allow_origin: HeaderValue,
    allow_credentials: bool,
}

impl CorsLayer {
    /// Allow any origin.
    pub fn any_origin() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_credentials: false,
        }
    }

    /// Allow a single origin, with credentials.
    pub fn for_origin(origin: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            allow_origin: HeaderValue::from_str(origin)?,
            allow_credentials: true,
        })
    }

    /// Apply CORS headers to a response
    pub fn apply_cors_headers(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Accept"),
        );
        if self.allow_credentials {
            headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    }
}

impl Default for CorsLayer {
    fn default() -> Self {
        Self::any_origin()
    }
}
