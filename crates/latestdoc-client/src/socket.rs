//! TCP client for a running latestdoc tool server.

use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpStream;
use tracing::{debug, warn};
use uuid::Uuid;

use latestdoc_protocol::{
    Envelope, Request, Response, ServiceInfo, ToolDescriptor, ToolOutcome, read_frame, write_frame,
};

use crate::error::{ClientError, ClientResult};

/// Client for communicating with the tool server.
pub struct ToolClient {
    addr: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ToolClient {
    /// Creates a client for `host:port`.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            api_key: None,
            timeout,
        }
    }

    /// Builder: send `api_key` with every request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends a request and waits for a response.
    ///
    /// Error responses are returned as `Ok`; see [`ToolClient::expect`].
    pub async fn send(&self, request: Request) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let mut envelope = Envelope::request(&request_id, request);
        envelope.api_key = self.api_key.clone();

        debug!(addr = %self.addr, request_id = %request_id, "connecting to server");

        let mut stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                ClientError::Connection(format!(
                    "connection to {} timed out after {}s",
                    self.addr,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ClientError::Connection(format!("failed to connect to {}: {}", self.addr, e)))?;

        write_frame(&mut stream, &envelope, self.timeout).await?;
        debug!("request sent, waiting for response");

        let response: Envelope<Response> = read_frame(&mut stream, self.timeout)
            .await?
            .ok_or_else(|| {
                ClientError::Protocol("server closed the connection without responding".into())
            })?;

        if response.request_id != request_id {
            warn!(
                expected = %request_id,
                received = %response.request_id,
                "response request_id mismatch"
            );
        }

        Ok(response.payload)
    }

    /// Sends a request and turns error responses into [`ClientError::Remote`].
    pub async fn expect(&self, request: Request) -> ClientResult<Response> {
        match self.send(request).await? {
            Response::Error { error } => Err(ClientError::Remote(error)),
            response => Ok(response),
        }
    }

    /// Pings the server to check if it's alive.
    pub async fn ping(&self) -> bool {
        matches!(self.send(Request::Ping).await, Ok(Response::Pong))
    }

    pub async fn describe(&self) -> ClientResult<ServiceInfo> {
        match self.expect(Request::Describe).await? {
            Response::Service { info } => Ok(info),
            other => Err(unexpected("service", &other)),
        }
    }

    pub async fn list_tools(&self) -> ClientResult<Vec<ToolDescriptor>> {
        match self.expect(Request::ListTools).await? {
            Response::Tools { tools } => Ok(tools),
            other => Err(unexpected("tools", &other)),
        }
    }

    pub async fn call_tool(&self, tool_id: &str, input: Value) -> ClientResult<ToolOutcome> {
        match self
            .expect(Request::call_tool_with_input(tool_id, input))
            .await?
        {
            Response::ToolResult { outcome } => Ok(outcome),
            other => Err(unexpected("tool_result", &other)),
        }
    }
}

fn unexpected(expected: &str, response: &Response) -> ClientError {
    ClientError::Protocol(format!("expected {expected} response, got {response:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use latestdoc_core::FlattenedDocument;
    use latestdoc_protocol::ErrorCode;
    use latestdoc_providers::{BoxFuture, ProviderResult};
    use latestdoc_server::{
        DocumentFetcher, LatestDocumentTool, RequestHandler, ServerConfig, SignalHandler,
        TcpServer, ToolRegistry, make_connection_handler,
    };

    struct StaticFetcher;

    impl DocumentFetcher for StaticFetcher {
        fn fetch_latest(&self) -> BoxFuture<'_, ProviderResult<FlattenedDocument>> {
            Box::pin(async {
                Ok(FlattenedDocument {
                    id: "doc-1".into(),
                    title: "Plan".into(),
                    content: "Hello\n".into(),
                })
            })
        }
    }

    /// Starts a server on an OS-assigned port and returns its address.
    async fn start_server(api_key: Option<&str>) -> (String, SignalHandler) {
        let signals = SignalHandler::new();
        let handler = RequestHandler::new(
            ServiceInfo::google_drive("test"),
            ToolRegistry::new().with_tool(LatestDocumentTool::new(Arc::new(StaticFetcher))),
            signals.shutdown_handle(),
        )
        .with_api_key(api_key.map(String::from));

        let server = TcpServer::bind(ServerConfig::new("127.0.0.1", 0))
            .await
            .unwrap();
        let addr = server.local_addr().to_string();
        let shutdown = signals.shutdown();
        tokio::spawn(async move {
            let _ = server
                .run_until_shutdown(make_connection_handler(Arc::new(handler)), shutdown.wait())
                .await;
        });
        (addr, signals)
    }

    fn client(addr: &str) -> ToolClient {
        ToolClient::new(addr, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn call_tool_returns_document_outcome() {
        let (addr, _signals) = start_server(Some("k")).await;
        let client = client(&addr).with_api_key(Some("k".into()));

        assert!(client.ping().await);
        let outcome = client
            .call_tool("get-latest-document", serde_json::json!({}))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.data()["title"], "Plan");
    }

    #[tokio::test]
    async fn describe_and_list_tools() {
        let (addr, _signals) = start_server(None).await;
        let client = client(&addr);

        let info = client.describe().await.unwrap();
        assert_eq!(info.title, "Google Drive Integration Service");

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools, vec![ToolDescriptor::latest_document()]);
    }

    #[tokio::test]
    async fn missing_api_key_is_remote_unauthorized() {
        let (addr, _signals) = start_server(Some("k")).await;

        let err = client(&addr).list_tools().await.unwrap_err();
        match err {
            ClientError::Remote(error) => assert_eq!(error.code, ErrorCode::Unauthorized),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_remote_not_found() {
        let (addr, _signals) = start_server(None).await;

        let err = client(&addr)
            .call_tool("nope", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Remote(e) if e.code == ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn connection_refused_is_connection_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = client(&format!("127.0.0.1:{port}"));

        assert!(!client.ping().await);
        assert!(matches!(
            client.send(Request::Ping).await,
            Err(ClientError::Connection(_))
        ));
    }
}
