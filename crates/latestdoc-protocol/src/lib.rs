//! Wire framing and tool request/response types for latestdoc.
//!
//! The tool server speaks Protocol v1 over TCP.
//!
//! # Protocol Overview
//!
//! Messages are sent as length-prefixed JSON:
//! - 4 bytes: message length (u32, big-endian)
//! - N bytes: JSON payload
//!
//! # Envelope Structure
//!
//! Every message is wrapped in an [`Envelope`] containing:
//! - `protocol_version`: Always "1" for this version
//! - `request_id`: identifier for request/response correlation
//! - `api_key`: the caller's key, required when the server has one configured
//! - `payload`: the actual request or response
//!
//! # Example
//!
//! ```rust
//! use latestdoc_protocol::{Envelope, Request, encode_message, decode_message};
//!
//! let request = Envelope::request("req-123", Request::ListTools);
//! let bytes = encode_message(&request).unwrap();
//! let decoded: Envelope<Request> = decode_message(&bytes).unwrap();
//! assert_eq!(decoded.request_id, "req-123");
//! ```

mod error;
mod framing;
mod stream;
mod tool;
mod types;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{decode_message, encode_message};
pub use stream::{read_frame, write_frame};
pub use tool::{Card, ServiceInfo, ToolDescriptor, ToolOutcome};
pub use types::{Envelope, ErrorCode, ErrorResponse, Request, Response};

/// Protocol version constant.
pub const PROTOCOL_VERSION: &str = "1";

/// Maximum message size (16 MiB); documents can be large.
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;
