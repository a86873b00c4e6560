//! Request and response types for the latestdoc tool protocol.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::PROTOCOL_VERSION;
use crate::tool::{ServiceInfo, ToolDescriptor, ToolOutcome};

/// Outer frame around every request and response.
///
/// Carries the protocol version, a correlation id and, for requests, the
/// caller's API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Wire version, `"1"` today.
    pub protocol_version: String,
    /// Echoed back unchanged in the response.
    pub request_id: String,
    /// API key presented by the caller. Never set on responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps `payload` under [`PROTOCOL_VERSION`].
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            api_key: None,
            payload,
        }
    }

    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Builder: attach an API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Whether the sender speaks our protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// What a caller can ask the service to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Liveness probe.
    Ping,

    /// Describe the service.
    Describe,

    /// List the registered tools.
    ListTools,

    /// Invoke a tool.
    CallTool {
        tool_id: String,
        /// Tool input; must be a JSON object.
        #[serde(default = "empty_object")]
        input: Value,
    },

    /// Ask the server to stop accepting work.
    Shutdown,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Request {
    /// Creates a CallTool request with an empty input object.
    pub fn call_tool(tool_id: impl Into<String>) -> Self {
        Self::CallTool {
            tool_id: tool_id.into(),
            input: empty_object(),
        }
    }

    /// Creates a CallTool request with the given input.
    pub fn call_tool_with_input(tool_id: impl Into<String>, input: Value) -> Self {
        Self::CallTool {
            tool_id: tool_id.into(),
            input,
        }
    }
}

/// Server replies, one per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,

    /// Service metadata.
    Service {
        #[serde(flatten)]
        info: ServiceInfo,
    },

    /// Registered tools.
    Tools { tools: Vec<ToolDescriptor> },

    /// Result of a tool invocation.
    ToolResult { outcome: ToolOutcome },

    /// Acknowledges a request with no data to return.
    Ok,

    /// Error response.
    Error {
        /// Error details.
        #[serde(flatten)]
        error: ErrorResponse,
    },
}

impl Response {
    /// Creates a Service response.
    pub fn service(info: ServiceInfo) -> Self {
        Self::Service { info }
    }

    /// Creates a Tools response.
    pub fn tools(tools: Vec<ToolDescriptor>) -> Self {
        Self::Tools { tools }
    }

    /// Creates a ToolResult response.
    pub fn tool_result(outcome: ToolOutcome) -> Self {
        Self::ToolResult { outcome }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }

    pub fn from_error(error: ErrorResponse) -> Self {
        Self::Error { error }
    }

    /// Returns true unless this is an error response.
    ///
    /// A `ToolResult` carrying a failure outcome still counts as a
    /// successful exchange at the protocol level.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// The error payload, when there is one.
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Machine-readable reason a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Something broke on the server side.
    InternalError,

    /// Invalid request format or tool input.
    InvalidRequest,

    /// Missing or wrong API key.
    Unauthorized,

    /// Unknown tool id.
    NotFound,

    /// Request timed out.
    Timeout,

    /// Shutdown has begun; only `shutdown` is still accepted.
    ShuttingDown,
}

impl ErrorCode {
    /// Short English phrase used when displaying the error.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InternalError => "Internal server failure",
            Self::InvalidRequest => "Malformed request",
            Self::Unauthorized => "The API key is missing or invalid",
            Self::NotFound => "Requested tool not found",
            Self::Timeout => "Request exceeded its time limit",
            Self::ShuttingDown => "Service is stopping",
        }
    }
}

/// Body of an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code.description())
    }
}

impl std::error::Error for ErrorResponse {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_envelope_is_current_version() {
        let envelope = Envelope::request("ping-7", Request::Ping);
        assert_eq!(envelope.protocol_version, PROTOCOL_VERSION);
        assert_eq!(envelope.request_id, "ping-7");
        assert!(envelope.api_key.is_none());
        assert!(envelope.is_compatible());
    }

    #[test]
    fn other_version_is_incompatible() {
        let envelope = Envelope {
            protocol_version: "9".into(),
            request_id: "old".into(),
            api_key: None,
            payload: Request::Ping,
        };
        assert!(!envelope.is_compatible());
    }

    #[test]
    fn envelope_omits_absent_api_key() {
        let json = serde_json::to_value(Envelope::request("r", Request::Ping)).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "payload": {
            "type": "ping"
          },
          "protocol_version": "1",
          "request_id": "r"
        }
        "#);
    }

    #[test]
    fn envelope_with_api_key() {
        let envelope = Envelope::request("r", Request::ListTools).with_api_key("secret");
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains(r#""api_key":"secret""#));

        let parsed: Envelope<Request> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn request_serde_unit_variants() {
        for (request, expected) in [
            (Request::Ping, r#"{"type":"ping"}"#),
            (Request::Describe, r#"{"type":"describe"}"#),
            (Request::ListTools, r#"{"type":"list_tools"}"#),
            (Request::Shutdown, r#"{"type":"shutdown"}"#),
        ] {
            assert_eq!(serde_json::to_string(&request).unwrap(), expected);
            let parsed: Request = serde_json::from_str(expected).unwrap();
            assert_eq!(parsed, request);
        }
    }

    #[test]
    fn request_serde_call_tool() {
        let request = Request::call_tool("get-latest-document");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"type":"call_tool","tool_id":"get-latest-document","input":{}}"#
        );
    }

    #[test]
    fn call_tool_input_defaults_to_empty_object() {
        let parsed: Request =
            serde_json::from_str(r#"{"type":"call_tool","tool_id":"get-latest-document"}"#).unwrap();
        assert_eq!(parsed, Request::call_tool("get-latest-document"));
    }

    #[test]
    fn call_tool_keeps_arbitrary_input() {
        let request = Request::call_tool_with_input("t", json!({"extra": 1}));
        let json = serde_json::to_string(&request).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();
        match parsed {
            Request::CallTool { input, .. } => assert_eq!(input, json!({"extra": 1})),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn response_serde_ok_and_pong() {
        assert_eq!(serde_json::to_string(&Response::Ok).unwrap(), r#"{"type":"ok"}"#);
        assert_eq!(
            serde_json::to_string(&Response::Pong).unwrap(),
            r#"{"type":"pong"}"#
        );
    }

    #[test]
    fn error_reply_flattens_details() {
        let response = Response::error(ErrorCode::Unauthorized, "bad key");
        let json = serde_json::to_value(&response).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "code": "unauthorized",
          "message": "bad key",
          "type": "error"
        }
        "#);

        let parsed: Response = serde_json::from_value(json).unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed.as_error().unwrap().code, ErrorCode::Unauthorized);
    }

    #[test]
    fn response_serde_tool_result() {
        let outcome = ToolOutcome::failure("boom");
        let response = Response::tool_result(outcome.clone());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed, Response::ToolResult { outcome });
    }

    #[test]
    fn error_display_leads_with_message() {
        let error = ErrorResponse::not_found("unknown tool: x");
        assert_eq!(error.to_string(), "unknown tool: x (Requested tool not found)");
    }
}
