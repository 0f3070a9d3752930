//! Domain error taxonomy and its mapping onto JSON-RPC error codes.
//!
//! Every fallible operation below the transport boundary returns
//! `Result<T, BrowserError>`. The router is the only place that turns a
//! `BrowserError` into the wire `{code, message, data?}` shape.

use std::fmt;

/// A domain error kind, independent of how it is eventually serialized.
#[derive(Debug, Clone)]
pub enum BrowserError {
    /// The received line was not valid JSON.
    Parse(String),
    /// The envelope was missing `jsonrpc: "2.0"` or `method`.
    Envelope(String),
    /// No handler is registered for the given method name.
    MethodNotFound(String),
    /// Required params were missing or had the wrong shape.
    InvalidParams(String),
    /// `tabId` did not resolve to a live tab.
    TabNotFound(String),
    /// `sessionId` did not resolve to a live session.
    SessionNotFound(String),
    /// A wait (idle navigation, selector) exceeded its deadline.
    Timeout(String),
    /// URL parsing failed or the engine reported a navigation failure.
    Navigation(String),
    /// The page-side script threw or the evaluator rejected.
    JavaScript(String),
    /// An illegal learn-recorder state transition or conflicting request.
    LearnMode(String),
    /// Anything else.
    Internal(String),
}

impl BrowserError {
    /// The JSON-RPC error code this domain error maps to (spec §4.1/§7).
    pub fn rpc_code(&self) -> i64 {
        match self {
            BrowserError::Parse(_) => -32700,
            BrowserError::Envelope(_) => -32600,
            BrowserError::MethodNotFound(_) => -32601,
            BrowserError::InvalidParams(_) => -32602,
            BrowserError::TabNotFound(_) => -32000,
            BrowserError::JavaScript(_) => -32001,
            BrowserError::Navigation(_) => -32002,
            BrowserError::Timeout(_) => -32003,
            BrowserError::SessionNotFound(_) => -32004,
            BrowserError::LearnMode(_) => -32005,
            BrowserError::Internal(_) => -32603,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            BrowserError::Parse(m)
            | BrowserError::Envelope(m)
            | BrowserError::MethodNotFound(m)
            | BrowserError::InvalidParams(m)
            | BrowserError::TabNotFound(m)
            | BrowserError::SessionNotFound(m)
            | BrowserError::Timeout(m)
            | BrowserError::Navigation(m)
            | BrowserError::JavaScript(m)
            | BrowserError::LearnMode(m)
            | BrowserError::Internal(m) => m,
        }
    }

    pub fn tab_not_found(tab_id: impl Into<String>) -> Self {
        let tab_id = tab_id.into();
        BrowserError::TabNotFound(format!("no such tab: {}", tab_id))
    }

    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        BrowserError::SessionNotFound(format!("no such session: {}", session_id))
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        BrowserError::InvalidParams(msg.into())
    }
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BrowserError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_codes_match_spec() {
        assert_eq!(BrowserError::Parse("x".into()).rpc_code(), -32700);
        assert_eq!(BrowserError::Envelope("x".into()).rpc_code(), -32600);
        assert_eq!(BrowserError::MethodNotFound("x".into()).rpc_code(), -32601);
        assert_eq!(BrowserError::InvalidParams("x".into()).rpc_code(), -32602);
        assert_eq!(BrowserError::tab_not_found("tab9").rpc_code(), -32000);
        assert_eq!(BrowserError::JavaScript("x".into()).rpc_code(), -32001);
        assert_eq!(BrowserError::Navigation("x".into()).rpc_code(), -32002);
        assert_eq!(BrowserError::Timeout("x".into()).rpc_code(), -32003);
        assert_eq!(BrowserError::session_not_found("s9").rpc_code(), -32004);
        assert_eq!(BrowserError::LearnMode("x".into()).rpc_code(), -32005);
        assert_eq!(BrowserError::Internal("x".into()).rpc_code(), -32603);
    }

    #[test]
    fn tab_not_found_message_includes_id() {
        let err = BrowserError::tab_not_found("tab3");
        assert!(err.message().contains("tab3"));
    }
}
