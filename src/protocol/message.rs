//! Wire-level JSON-RPC 2.0 message shapes (spec §4.1/§6.2).
//!
//! Requests are deserialized leniently into [`RpcRequest`] so that envelope
//! validation (missing `jsonrpc`/`method`) happens explicitly in the
//! dispatcher rather than as an opaque serde failure — a parse failure and
//! an envelope failure map to different RPC codes (`-32700` vs `-32600`).

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::BrowserError;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    /// Validate the envelope, returning the method name once it is known
    /// to be well-formed. Does not validate `params` against the method's
    /// schema — that happens per-handler (`-32602` on mismatch).
    pub fn validate(&self) -> Result<&str, BrowserError> {
        match &self.jsonrpc {
            Some(v) if v == "2.0" => {}
            _ => return Err(BrowserError::Envelope("missing or invalid jsonrpc version".into())),
        }
        match &self.method {
            Some(m) if !m.is_empty() => Ok(m.as_str()),
            _ => Err(BrowserError::Envelope("missing method".into())),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Build a success response line: `{jsonrpc, id, result}`.
pub fn success_response(id: i64, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Build an error response line: `{jsonrpc, id, error:{code,message,data?}}`.
/// `id` is `null` when the request's id could not be determined (parse or
/// missing-id envelope failures).
pub fn error_response(id: Option<i64>, err: &BrowserError, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": err.rpc_code(),
        "message": err.message(),
    });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error,
    })
}

/// Build a server-originated notification (spec §6.2): no `id`.
pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_missing_jsonrpc() {
        let req: RpcRequest = serde_json::from_str(r#"{"method":"navigate","id":1}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.rpc_code(), -32600);
    }

    #[test]
    fn validate_rejects_missing_method() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert_eq!(err.rpc_code(), -32600);
    }

    #[test]
    fn validate_accepts_well_formed_request() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"navigate","params":{}}"#)
                .unwrap();
        assert_eq!(req.validate().unwrap(), "navigate");
    }

    #[test]
    fn notification_has_no_id() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping"}"#).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn success_response_shape() {
        let v = success_response(4, json!({"ok": true}));
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["id"], 4);
        assert_eq!(v["result"]["ok"], true);
    }

    #[test]
    fn error_response_null_id_when_unknown() {
        let v = error_response(None, &BrowserError::Parse("bad json".into()), None);
        assert!(v["id"].is_null());
        assert_eq!(v["error"]["code"], -32700);
    }
}
