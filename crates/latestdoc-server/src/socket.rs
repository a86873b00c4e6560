//! TCP listener for the tool protocol.
//!
//! Accepts connections up to the configured limit and exposes each one as a
//! [`Connection`] that reads request envelopes and writes response envelopes.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info};

use latestdoc_protocol::{Envelope, Request, Response, read_frame, write_frame};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Listening socket plus the slot pool that caps concurrent connections.
pub struct TcpServer {
    config: ServerConfig,
    listener: TcpListener,
    /// Resolved address, so port 0 reports the real port.
    local_addr: SocketAddr,
    slots: Arc<Semaphore>,
}

impl TcpServer {
    /// Binds to `config.addr()`.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;

        let addr = config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(&addr, e))?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "tool server bound");

        let slots = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            local_addr,
            slots,
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts a single connection, waiting for a free slot first.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServerError::Shutdown)?;

        let (stream, peer) = self.listener.accept().await?;
        debug!(%peer, "connection accepted");

        Ok(Connection {
            stream,
            peer,
            timeout: self.config.connection_timeout,
            _permit: permit,
        })
    }

    /// Runs the accept loop, spawning `handler` for each connection.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(connection) => {
                    tokio::spawn(handler(connection));
                }
                Err(ServerError::Shutdown) => return Ok(()),
                Err(e) => {
                    error!(error = %e, "accept failed, continuing");
                }
            }
        }
    }

    /// Runs the accept loop until `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        S: Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("stopping accept loop");
                Ok(())
            }
        }
    }
}

/// One accepted client, holding a connection slot until dropped.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl Connection {
    /// Remote address of the client.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Next request frame, or `None` once the client hangs up between frames.
    pub async fn read_request(&mut self) -> ServerResult<Option<Envelope<Request>>> {
        Ok(read_frame(&mut self.stream, self.timeout).await?)
    }

    pub async fn write_response(&mut self, envelope: &Envelope<Response>) -> ServerResult<()> {
        Ok(write_frame(&mut self.stream, envelope, self.timeout).await?)
    }

    /// Wraps `response` in an envelope echoing `request_id` and writes it.
    pub async fn respond(
        &mut self,
        request_id: impl Into<String>,
        response: Response,
    ) -> ServerResult<()> {
        let envelope = Envelope::response(request_id, response);
        self.write_response(&envelope).await
    }
}
