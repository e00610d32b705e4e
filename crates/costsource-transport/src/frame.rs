//! Wire frames exchanged over the in-memory duplex pipe.
//!
//! Each frame is one JSON document inside a length-delimited envelope. The
//! client sends `Call` and `Cancel` frames; the server answers each call with
//! exactly one `Reply`, unless the client cancelled it first.

use costsource_core::{Error, Result, Status};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::bytes::Bytes;

/// Frame sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ClientFrame {
    /// Invoke `method` with a JSON-encoded request.
    Call {
        id: u64,
        /// Method wire name; unknown names are answered with `Unimplemented`.
        method: String,
        /// Caller's remaining time budget in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
        payload: Value,
    },
    /// The caller gave up on call `id`.
    Cancel { id: u64 },
}

/// Frame sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ServerFrame {
    /// Outcome of call `id`.
    Reply {
        id: u64,
        outcome: std::result::Result<Value, Status>,
    },
}

pub(crate) fn encode<T: Serialize>(frame: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(frame)?))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::SerializationError {
        message: format!("malformed frame: {e}"),
        source: Some(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_frame_layout() {
        let frame = ClientFrame::Call {
            id: 7,
            method: "actual_cost".to_string(),
            timeout_ms: None,
            payload: json!({"resource_id": "i-1"}),
        };
        let value: Value = serde_json::from_slice(&encode(&frame).unwrap()).unwrap();

        assert_eq!(value["type"], "call");
        assert_eq!(value["id"], 7);
        assert!(value.get("timeout_ms").is_none());
        assert_eq!(decode::<ClientFrame>(&encode(&frame).unwrap()).unwrap(), frame);
    }

    #[test]
    fn test_reply_carries_status() {
        let frame = ServerFrame::Reply {
            id: 3,
            outcome: Err(Status::invalid_argument("bad window")),
        };
        let decoded: ServerFrame = decode(&encode(&frame).unwrap()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        let err = decode::<ClientFrame>(b"{not json").unwrap_err();
        assert!(err.is_serialization_error());
    }
}
