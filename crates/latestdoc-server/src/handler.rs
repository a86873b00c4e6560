//! Request/response dispatch handler.
//!
//! Authenticates each request envelope, then routes it to the service
//! metadata, the tool registry or the shutdown handle.

use std::sync::Arc;

use tracing::{Span, debug, info, warn};

use latestdoc_protocol::{
    Envelope, ErrorCode, ErrorResponse, PROTOCOL_VERSION, Request, Response, ServiceInfo,
};

use crate::error::{ServerError, ServerResult};
use crate::signals::ShutdownHandle;
use crate::socket::Connection;
use crate::tool::ToolRegistry;

/// Request handler that processes incoming requests and produces responses.
pub struct RequestHandler {
    service: ServiceInfo,
    registry: ToolRegistry,
    api_key: Option<String>,
    shutdown: ShutdownHandle,
}

impl RequestHandler {
    pub fn new(service: ServiceInfo, registry: ToolRegistry, shutdown: ShutdownHandle) -> Self {
        Self {
            service,
            registry,
            api_key: None,
            shutdown,
        }
    }

    /// Builder: require `api_key` on every request. `None` disables the check.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Handles a single request envelope and returns the response payload.
    #[tracing::instrument(
        skip(self, envelope),
        fields(request_id = %envelope.request_id, request_type, duration_ms)
    )]
    pub async fn handle(&self, envelope: &Envelope<Request>) -> Response {
        let start = std::time::Instant::now();
        let request_type = request_type(&envelope.payload);
        Span::current().record("request_type", request_type);

        let response = match self.check_envelope(envelope) {
            Ok(()) => self.dispatch(&envelope.payload).await,
            Err(error) => {
                warn!(code = ?error.code, "Rejected request: {}", error.message);
                Response::from_error(error)
            }
        };

        let duration = start.elapsed();
        if tracing::enabled!(tracing::Level::DEBUG) {
            Span::current().record("duration_ms", duration.as_millis());
            debug!(
                request_type,
                duration_ms = duration.as_millis(),
                "Request handled"
            );
        }

        response
    }

    fn check_envelope(&self, envelope: &Envelope<Request>) -> Result<(), ErrorResponse> {
        if let Some(expected) = &self.api_key
            && envelope.api_key.as_deref() != Some(expected.as_str())
        {
            return Err(ErrorResponse::unauthorized("missing or invalid API key"));
        }

        if !envelope.is_compatible() {
            return Err(ErrorResponse::invalid_request(format!(
                "unsupported protocol version {} (expected {PROTOCOL_VERSION})",
                envelope.protocol_version
            )));
        }

        if self.shutdown.is_shutdown() && envelope.payload != Request::Shutdown {
            return Err(ErrorResponse::new(
                ErrorCode::ShuttingDown,
                "server is shutting down",
            ));
        }

        Ok(())
    }

    async fn dispatch(&self, request: &Request) -> Response {
        match request {
            Request::Ping => Response::Pong,
            Request::Describe => Response::service(self.service.clone()),
            Request::ListTools => Response::tools(self.registry.descriptors()),
            Request::CallTool { tool_id, input } => {
                debug!(tool = %tool_id, "Handling CallTool request");
                if !input.is_object() {
                    return Response::from_error(ErrorResponse::invalid_request(
                        "tool input must be a JSON object",
                    ));
                }
                match self.registry.get(tool_id) {
                    Some(tool) => Response::tool_result(tool.call(input).await),
                    None => Response::from_error(ErrorResponse::not_found(format!(
                        "unknown tool: {tool_id}"
                    ))),
                }
            }
            Request::Shutdown => {
                info!("Handling Shutdown request");
                self.shutdown.trigger();
                Response::Ok
            }
        }
    }

    /// Handles a connection, processing all requests until the connection closes.
    pub async fn handle_connection(&self, mut conn: Connection) -> ServerResult<()> {
        let peer = conn.peer();
        loop {
            match conn.read_request().await {
                Ok(Some(envelope)) => {
                    let response = self.handle(&envelope).await;
                    conn.respond(&envelope.request_id, response).await?;

                    if self.shutdown.is_shutdown() {
                        return Err(ServerError::Shutdown);
                    }
                }
                Ok(None) => {
                    debug!(%peer, "Client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(%peer, error = %e, "Error reading request");
                    return Err(e);
                }
            }
        }
    }
}

fn request_type(request: &Request) -> &'static str {
    match request {
        Request::Ping => "ping",
        Request::Describe => "describe",
        Request::ListTools => "list_tools",
        Request::CallTool { .. } => "call_tool",
        Request::Shutdown => "shutdown",
    }
}

/// Creates a connection handler for use with `TcpServer::run`.
pub fn make_connection_handler(
    handler: Arc<RequestHandler>,
) -> impl Fn(Connection) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
+ Send
+ Sync
+ 'static {
    move |conn| {
        let handler = handler.clone();
        Box::pin(async move {
            if let Err(e) = handler.handle_connection(conn).await
                && !matches!(e, ServerError::Shutdown)
            {
                warn!(error = %e, "Connection handler error");
            }
        })
    }
}
