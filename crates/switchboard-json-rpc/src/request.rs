use std::collections::HashMap;

use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::error::{DecodeError, JsonRpcErrorObject};
use crate::types::{IdError, RequestId};

/// Raw `params` of a request.
///
/// The dispatcher never interprets parameters; handlers read them either as a
/// byte stream or by deserializing into their own types.
#[derive(Debug, Clone, Default)]
pub struct Params {
    raw: Option<Box<RawValue>>,
}

impl Params {
    /// No `params` member was sent.
    pub fn absent() -> Self {
        Self { raw: None }
    }

    pub fn from_raw(raw: Box<RawValue>) -> Self {
        Self { raw: Some(raw) }
    }

    /// Serialize `value` into raw parameters.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::value::to_raw_value(value).map(Self::from_raw)
    }

    pub fn is_absent(&self) -> bool {
        self.raw.is_none()
    }

    pub fn as_raw(&self) -> Option<&RawValue> {
        self.raw.as_deref()
    }

    /// The raw JSON text; empty when no parameters were sent.
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_deref().map(|raw| raw.get().as_bytes()).unwrap_or_default()
    }

    /// The raw parameters as an input stream.
    pub fn reader(&self) -> impl std::io::Read + '_ {
        self.as_bytes()
    }

    /// Deserialize the parameters, reporting failures as InvalidParams.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, JsonRpcErrorObject> {
        let raw = self.raw.as_deref().ok_or_else(|| {
            JsonRpcErrorObject::invalid_params(Some(Value::String("missing params".to_string())))
        })?;
        serde_json::from_str(raw.get()).map_err(|err| {
            JsonRpcErrorObject::invalid_params(Some(Value::String(err.to_string())))
        })
    }
}

impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.raw {
            Some(raw) => raw.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// A decoded JSON-RPC request envelope.
///
/// Decoding only checks member types; envelope rules are checked separately by
/// [`JsonRpcRequest::validate`] so that a notification with a bad envelope can
/// still be classified as a notification.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: String,
    pub method: String,
    #[serde(skip_serializing_if = "Params::is_absent")]
    pub params: Params,
    #[serde(skip_serializing_if = "is_absent_id")]
    pub id: RequestId,
}

fn is_absent_id(id: &RequestId) -> bool {
    matches!(id, RequestId::Absent)
}

/// Top-level members captured as raw JSON text. Nesting inside a member is
/// scanned but not parsed, so deeply nested `params` are not subject to the
/// parser's recursion limit. Repeated keys keep the last occurrence.
type RawMembers = HashMap<String, Box<RawValue>>;

fn decode_id(raw: &RawValue) -> Result<RequestId, DecodeError> {
    let text = raw.get();
    match text.as_bytes().first() {
        Some(b'[') => Err(IdError::Array.into()),
        Some(b'{') => Err(IdError::Object.into()),
        _ => {
            let value: Value = serde_json::from_str(text).map_err(DecodeError::Syntax)?;
            Ok(RequestId::from_value(&value)?)
        }
    }
}

/// A string member; `null` reads the same as a missing member.
fn decode_string_member(
    members: &RawMembers,
    name: &str,
    id: &RequestId,
) -> Result<String, DecodeError> {
    let Some(raw) = members.get(name) else {
        return Ok(String::new());
    };
    serde_json::from_str::<Option<String>>(raw.get())
        .map(Option::unwrap_or_default)
        .map_err(|source| DecodeError::InvalidMember {
            id: id.clone(),
            source,
        })
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Params) -> Self {
        Self {
            version: crate::JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Create a notification (no id)
    pub fn notification(method: impl Into<String>, params: Params) -> Self {
        Self::new(RequestId::Absent, method, params)
    }

    /// Decode a request from raw bytes.
    ///
    /// Bytes that are not JSON fail with [`DecodeError::Syntax`]. JSON that is
    /// not a request object, carries an illegal id shape, or has a member of
    /// the wrong type fails with one of the typed variants.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut members: RawMembers = match serde_json::from_slice(bytes) {
            Ok(members) => members,
            Err(err) if err.is_data() => {
                // Not an object; tell well-formed JSON apart from garbage
                serde_json::from_slice::<IgnoredAny>(bytes).map_err(DecodeError::Syntax)?;
                return Err(DecodeError::NotAnObject);
            }
            Err(err) => return Err(DecodeError::Syntax(err)),
        };

        let id = match members.get("id") {
            Some(raw_id) => decode_id(raw_id)?,
            None => RequestId::Absent,
        };
        let version = decode_string_member(&members, "jsonrpc", &id)?;
        let method = decode_string_member(&members, "method", &id)?;
        let params = match members.remove("params") {
            Some(raw) => Params::from_raw(raw),
            None => Params::absent(),
        };

        Ok(Self {
            version,
            method,
            params,
            id,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_notification()
    }

    /// Check the envelope rules: protocol version and a non-empty method.
    pub fn validate(&self) -> Result<(), JsonRpcErrorObject> {
        if self.version != crate::JSONRPC_VERSION {
            return Err(JsonRpcErrorObject::invalid_request(Some(Value::String(
                "invalid json-rpc version".to_string(),
            ))));
        }
        if self.method.is_empty() {
            return Err(JsonRpcErrorObject::invalid_request(Some(Value::String(
                "method is empty".to_string(),
            ))));
        }
        Ok(())
    }
}
