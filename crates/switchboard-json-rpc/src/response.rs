use std::io;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{EncodeError, JsonRpcErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// Output sink a handler writes its success payload into.
///
/// The payload must end up as exactly one JSON value. [`std::io::Write`]
/// appends raw bytes; [`ResultWriter::write_json`] replaces the contents.
#[derive(Debug, Default)]
pub struct ResultWriter {
    buf: Vec<u8>,
}

impl ResultWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the payload with the JSON serialization of `value`.
    pub fn write_json<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, value)
    }

    /// Nothing but whitespace has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.iter().all(u8::is_ascii_whitespace)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Turn the written bytes into a response result. An empty sink yields no
    /// result at all.
    pub fn into_result(self) -> Result<Option<Box<RawValue>>, EncodeError> {
        if self.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice::<Box<RawValue>>(&self.buf)
            .map(Some)
            .map_err(EncodeError::InvalidResult)
    }
}

impl io::Write for ResultWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A JSON-RPC response envelope.
///
/// Exactly one of `result` and `error` must be set; [`JsonRpcResponse::encode`]
/// refuses anything else.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
    pub id: RequestId,
}

impl JsonRpcResponse {
    pub fn new(
        id: RequestId,
        result: Option<Box<RawValue>>,
        error: Option<JsonRpcErrorObject>,
    ) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            error,
            id,
        }
    }

    pub fn success(id: RequestId, result: Box<RawValue>) -> Self {
        Self::new(id, Some(result), None)
    }

    pub fn error(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self::new(id, None, Some(error))
    }

    /// Build a success response from whatever a handler wrote.
    pub fn from_writer(id: RequestId, writer: ResultWriter) -> Result<Self, EncodeError> {
        Ok(Self::new(id, writer.into_result()?, None))
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serialize the response.
    ///
    /// Fails only when the envelope invariant is broken, which is a
    /// programming error on the producing side rather than a client fault.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        match (&self.result, &self.error) {
            (Some(_), Some(_)) => Err(EncodeError::BothResultAndError),
            (None, None) => Err(EncodeError::NeitherResultNorError),
            _ => Ok(serde_json::to_vec(self)?),
        }
    }
}
