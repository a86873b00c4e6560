//! Operator consent for the OAuth authorization-code grant.
//!
//! A [`ConsentPrompt`] shows the authorization URL to whoever operates the
//! process and hands back the authorization code. The caller bounds the wait
//! with a timeout, so implementations may block indefinitely.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::fetcher::BoxFuture;

use super::config::ClientSecret;
use super::oauth::PkceFlow;

/// What a prompt needs to build the authorization URL.
#[derive(Debug, Clone, Copy)]
pub struct ConsentRequest<'a> {
    pub client: &'a ClientSecret,
    pub scopes: &'a [String],
    pub pkce: &'a PkceFlow,
}

/// An authorization code together with the redirect URI it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub redirect_uri: String,
}

/// Obtains an authorization code from the operator.
pub trait ConsentPrompt: Send + Sync {
    fn obtain_code<'a>(
        &'a self,
        request: ConsentRequest<'a>,
    ) -> BoxFuture<'a, ProviderResult<AuthorizationCode>>;
}

/// Query parameters of an OAuth redirect.
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn parse_callback_query(query: &str) -> CallbackParams {
    let mut params = CallbackParams::default();
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "code" => params.code = Some(value),
            "state" => params.state = Some(value),
            "error" => params.error = Some(value),
            _ => {}
        }
    }
    params
}

/// Returns the code from what the operator pasted: either the bare code or
/// the whole redirect URL.
fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match input.split_once('?') {
        Some((_, query)) if query.contains("code=") => parse_callback_query(query).code,
        _ => Some(input.to_string()),
    }
}

/// Where [`ConsolePrompt`] gets operator input from.
#[derive(Debug)]
enum LineSource {
    /// Stdin, read on first use.
    Stdin,
    Lines(mpsc::Receiver<String>),
}

/// Prints the URL and reads the pasted code from stdin.
///
/// Uses the first redirect URI registered for the OAuth client. Input is read
/// by one long-lived reader, so a prompt abandoned by a timeout leaves the
/// next line for the next prompt.
#[derive(Debug)]
pub struct ConsolePrompt {
    lines: Mutex<LineSource>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(LineSource::Stdin),
        }
    }

    /// Reads operator input from `reader` instead of stdin.
    ///
    /// Spawns the reader task, so this must run inside a Tokio runtime.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        tokio::spawn(async move {
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
        Self {
            lines: Mutex::new(LineSource::Lines(rx)),
        }
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

const LINE_BUFFER: usize = 8;

/// Forwards stdin lines from a plain thread. Tokio's own stdin reads on the
/// blocking pool, which cannot be cancelled and holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    let spawned = std::thread::Builder::new()
        .name("consent-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start stdin reader");
    }
    rx
}

impl ConsentPrompt for ConsolePrompt {
    fn obtain_code<'a>(
        &'a self,
        request: ConsentRequest<'a>,
    ) -> BoxFuture<'a, ProviderResult<AuthorizationCode>> {
        Box::pin(async move {
            let mut source = self.lines.lock().await;
            if matches!(*source, LineSource::Stdin) {
                *source = LineSource::Lines(spawn_stdin_reader());
            }
            let LineSource::Lines(lines) = &mut *source else {
                return Err(ProviderError::internal("console input not initialised"));
            };

            // Drop anything typed after an earlier prompt gave up.
            while let Ok(stale) = lines.try_recv() {
                debug!(len = stale.len(), "discarding stale console input");
            }

            let redirect_uri = request.client.redirect_uri().to_string();
            let url =
                request
                    .pkce
                    .build_auth_url(&request.client.client_id, &redirect_uri, request.scopes);

            eprintln!("\nAuthorize this app by visiting this URL:\n\n{url}\n");
            eprint!("Enter the code from that page here: ");

            let line = lines.recv().await.ok_or_else(|| {
                ProviderError::authorization_denied("stdin closed before a code was entered")
            })?;
            let code = extract_code(&line).ok_or_else(|| {
                ProviderError::authorization_denied("no authorization code entered")
            })?;
            Ok(AuthorizationCode { code, redirect_uri })
        })
    }
}

/// Opens the browser and receives the code on a local loopback redirect.
#[derive(Debug, Clone)]
pub struct LoopbackPrompt {
    /// Ports to try, inclusive. `(0, 0)` lets the OS choose.
    pub port_range: (u16, u16),
    pub open_browser: bool,
}

impl Default for LoopbackPrompt {
    fn default() -> Self {
        Self {
            port_range: (8080, 8090),
            open_browser: true,
        }
    }
}

impl LoopbackPrompt {
    /// Binds the first free port in `port_range` on 127.0.0.1.
    async fn bind(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
        for port in port_range.0..=port_range.1 {
            if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)).await {
                let port = listener
                    .local_addr()
                    .map_err(|e| ProviderError::internal("loopback address").with_source(e))?
                    .port();
                debug!(port, "bound loopback server");
                return Ok((listener, port));
            }
        }
        Err(ProviderError::configuration(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// Accepts connections until one carries the OAuth redirect.
    async fn wait_for_callback(listener: TcpListener) -> ProviderResult<(String, String)> {
        loop {
            let (stream, peer) = listener.accept().await.map_err(|e| {
                ProviderError::internal("failed to accept callback connection").with_source(e)
            })?;
            debug!(%peer, "callback connection");
            if let Some(result) = Self::handle_callback(stream).await {
                return result;
            }
        }
    }

    /// Returns `None` for requests that are not the redirect (favicon etc.).
    async fn handle_callback(stream: TcpStream) -> Option<ProviderResult<(String, String)>> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.ok()?;

        // GET /callback?code=...&state=... HTTP/1.1
        let mut parts = request_line.split_whitespace();
        let (Some("GET"), Some(path)) = (parts.next(), parts.next()) else {
            return None;
        };
        let mut stream = reader.into_inner();
        if !path.starts_with("/callback") {
            let _ = stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
                .await;
            return None;
        }

        let query = path.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let params = parse_callback_query(query);

        let response = if params.error.is_some() || params.code.is_none() {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><h1>Authorization Failed</h1>\
            <p>You can close this window.</p></body></html>"
        } else {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><h1>Authorization Successful</h1>\
            <p>You can close this window and return to the terminal.</p></body></html>"
        };
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;

        if let Some(error) = params.error {
            return Some(Err(ProviderError::authorization_denied(format!(
                "authorization denied: {error}"
            ))));
        }

        Some(match params.code {
            Some(code) => Ok((code, params.state.unwrap_or_default())),
            None => Err(ProviderError::authorization_denied(
                "missing authorization code in callback",
            )),
        })
    }
}

impl ConsentPrompt for LoopbackPrompt {
    fn obtain_code<'a>(
        &'a self,
        request: ConsentRequest<'a>,
    ) -> BoxFuture<'a, ProviderResult<AuthorizationCode>> {
        Box::pin(async move {
            let (listener, port) = Self::bind(self.port_range).await?;
            let redirect_uri = format!("http://127.0.0.1:{port}/callback");
            let url =
                request
                    .pkce
                    .build_auth_url(&request.client.client_id, &redirect_uri, request.scopes);

            info!("starting OAuth consent, waiting for browser redirect");
            if self.open_browser
                && let Err(e) = open::that(&url)
            {
                warn!(error = %e, "failed to open browser");
            }
            eprintln!("\nIf the browser did not open, visit this URL:\n\n{url}\n");

            let (code, state) = Self::wait_for_callback(listener).await?;
            if state != request.pkce.state {
                return Err(ProviderError::authorization_denied(
                    "OAuth state mismatch, possible CSRF attempt",
                ));
            }

            Ok(AuthorizationCode { code, redirect_uri })
        })
    }
}

/// Refuses consent; for unattended servers that must already hold a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPrompt;

impl ConsentPrompt for DisabledPrompt {
    fn obtain_code<'a>(
        &'a self,
        _request: ConsentRequest<'a>,
    ) -> BoxFuture<'a, ProviderResult<AuthorizationCode>> {
        Box::pin(async {
            Err(ProviderError::authorization_denied(
                "interactive consent is disabled; run `latestdoc auth` first",
            ))
        })
    }
}
