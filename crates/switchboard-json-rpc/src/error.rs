use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::types::{IdError, RequestId};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError => crate::error_codes::SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError => "Server error",
        }
    }

    /// Map a numeric code back onto the reserved taxonomy.
    pub fn from_code(code: i64) -> Option<Self> {
        [
            JsonRpcErrorCode::ParseError,
            JsonRpcErrorCode::InvalidRequest,
            JsonRpcErrorCode::MethodNotFound,
            JsonRpcErrorCode::InvalidParams,
            JsonRpcErrorCode::InternalError,
            JsonRpcErrorCode::ServerError,
        ]
        .into_iter()
        .find(|known| known.code() == code)
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
///
/// Built either by the dispatcher for protocol faults or by a handler for
/// application faults. Handlers can return it directly with `?`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data,
        }
    }

    /// An application-defined error outside the reserved taxonomy.
    pub fn custom(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn parse_error(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::ParseError, data)
    }

    pub fn invalid_request(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidRequest, data)
    }

    pub fn method_not_found(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::MethodNotFound, data)
    }

    pub fn invalid_params(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InvalidParams, data)
    }

    pub fn internal_error(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::InternalError, data)
    }

    pub fn server_error(data: Option<Value>) -> Self {
        Self::new(JsonRpcErrorCode::ServerError, data)
    }

    /// The reserved code this error carries, if any.
    pub fn error_code(&self) -> Option<JsonRpcErrorCode> {
        JsonRpcErrorCode::from_code(self.code)
    }
}

/// Failure to turn request bytes into a [`crate::JsonRpcRequest`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a JSON document at all.
    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("request must be a JSON object")]
    NotAnObject,

    #[error(transparent)]
    InvalidId(#[from] IdError),

    /// A member other than `id` has the wrong type. `id` is whatever could be
    /// recovered from the `id` member on its own.
    #[error("invalid request member: {source}")]
    InvalidMember {
        id: RequestId,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Structural failures map to ParseError, everything else is a typed
    /// failure and maps to InvalidRequest.
    pub fn is_structural(&self) -> bool {
        matches!(self, DecodeError::Syntax(_))
    }

    /// The id an error response for this failure should echo.
    pub fn response_id(&self) -> RequestId {
        match self {
            DecodeError::InvalidMember { id, .. } if !id.is_notification() => id.clone(),
            _ => RequestId::Null,
        }
    }
}

/// Failure to turn a [`crate::JsonRpcResponse`] into bytes.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("response carries both a result and an error")]
    BothResultAndError,

    #[error("response carries neither a result nor an error")]
    NeitherResultNorError,

    #[error("result is not a single JSON value: {0}")]
    InvalidResult(#[source] serde_json::Error),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fault returned by a method handler.
#[derive(Debug, Error)]
pub enum MethodError {
    /// A structured error, emitted verbatim.
    #[error(transparent)]
    Rpc(#[from] JsonRpcErrorObject),

    /// Anything else; reported as InternalError with the description as data.
    #[error("{0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl MethodError {
    pub fn internal(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        MethodError::Internal(err.into())
    }
}

impl From<serde_json::Error> for MethodError {
    fn from(err: serde_json::Error) -> Self {
        MethodError::Internal(Box::new(err))
    }
}

impl From<std::io::Error> for MethodError {
    fn from(err: std::io::Error) -> Self {
        MethodError::Internal(Box::new(err))
    }
}

/// Trait for errors that can be converted to JSON-RPC error objects
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this error to a JSON-RPC error object
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

impl ToJsonRpcError for DecodeError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        let data = Some(Value::String(self.to_string()));
        if self.is_structural() {
            JsonRpcErrorObject::parse_error(data)
        } else {
            JsonRpcErrorObject::invalid_request(data)
        }
    }
}

impl ToJsonRpcError for MethodError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            MethodError::Rpc(error) => error.clone(),
            MethodError::Internal(err) => {
                JsonRpcErrorObject::internal_error(Some(Value::String(err.to_string())))
            }
        }
    }
}

impl ToJsonRpcError for EncodeError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        JsonRpcErrorObject::internal_error(Some(Value::String(self.to_string())))
    }
}
