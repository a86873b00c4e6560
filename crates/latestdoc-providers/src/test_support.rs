//! One-shot HTTP responder for exercising the reqwest clients.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// What the responder received.
#[derive(Debug)]
pub(crate) struct RecordedRequest {
    pub request_line: String,
    pub body: String,
}

/// Accepts one connection, answers it with `status` and a JSON `body`, and
/// reports the request it read. Returns the base URL to point a client at.
pub(crate) async fn serve_once(
    status: u16,
    body: &str,
) -> (String, oneshot::Receiver<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let body = body.to_string();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.unwrap();

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().unwrap();
            }
        }

        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).await.unwrap();

        let response = format!(
            "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;

        let _ = tx.send(RecordedRequest {
            request_line: request_line.trim_end().to_string(),
            body: String::from_utf8_lossy(&request_body).into_owned(),
        });
    });

    (format!("http://{addr}"), rx)
}
