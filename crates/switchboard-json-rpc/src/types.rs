use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier of a JSON-RPC request.
///
/// The protocol allows exactly three shapes on the wire: a string, an integer
/// or `null`. `Absent` records that the `id` member was missing altogether.
/// Both `Absent` and `Null` mark the request as a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RequestId {
    #[default]
    Absent,
    Null,
    String(String),
    Number(i64),
}

/// Why a JSON value could not be turned into a [`RequestId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("request id must be a string, an integer or null, got a float")]
    Float,
    #[error("request id must be a string, an integer or null, got an array")]
    Array,
    #[error("request id must be a string, an integer or null, got an object")]
    Object,
    #[error("request id must be a string, an integer or null, got a boolean")]
    Boolean,
    #[error("request id integer does not fit in a signed 64-bit value")]
    OutOfRange,
}

impl RequestId {
    /// Decode an id from an already parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self, IdError> {
        match value {
            Value::Null => Ok(RequestId::Null),
            Value::String(s) => Ok(RequestId::String(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(RequestId::Number(i))
                } else if n.is_u64() {
                    Err(IdError::OutOfRange)
                } else {
                    Err(IdError::Float)
                }
            }
            Value::Array(_) => Err(IdError::Array),
            Value::Object(_) => Err(IdError::Object),
            Value::Bool(_) => Err(IdError::Boolean),
        }
    }

    /// Encode the id as it appears on the wire. Never fails.
    pub fn to_value(&self) -> Value {
        match self {
            RequestId::Absent | RequestId::Null => Value::Null,
            RequestId::String(s) => Value::String(s.clone()),
            RequestId::Number(n) => Value::from(*n),
        }
    }

    /// A request without a usable id expects no response.
    pub fn is_notification(&self) -> bool {
        matches!(self, RequestId::Absent | RequestId::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Textual form used for logging and correlation: strings are quoted,
/// integers are decimal, a missing id renders as the empty string.
impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Absent | RequestId::Null => Ok(()),
            RequestId::String(s) => {
                let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                f.write_str(&quoted)
            }
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestId::Absent | RequestId::Null => serializer.serialize_unit(),
            RequestId::String(s) => serializer.serialize_str(s),
            RequestId::Number(n) => serializer.serialize_i64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RequestId::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// JSON-RPC version
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
