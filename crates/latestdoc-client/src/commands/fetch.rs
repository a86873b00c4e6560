//! Fetch command: one-shot retrieval without a server.

use latestdoc_core::FlattenedDocument;
use latestdoc_providers::fetch_latest_document;

use crate::cli::GoogleArgs;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Fetches the latest document and prints it to stdout.
pub async fn run(config: &ClientConfig, args: &GoogleArgs, json: bool) -> ClientResult<()> {
    let manager = super::credential_manager(config, args, config.google.consent.prompt())?;
    let order_by = manager.config().order_by;

    let client = manager.acquire_client().await?;
    let document = fetch_latest_document(&client, order_by).await?;

    print!("{}", render(&document, json)?);
    Ok(())
}

fn render(document: &FlattenedDocument, json: bool) -> ClientResult<String> {
    if json {
        let mut out = serde_json::to_string_pretty(document)
            .map_err(|e| ClientError::Protocol(format!("failed to serialize document: {e}")))?;
        out.push('\n');
        Ok(out)
    } else {
        let mut out = format!("# {}\n\n{}", document.title, document.content);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> FlattenedDocument {
        FlattenedDocument {
            id: "doc-1".into(),
            title: "Plan".into(),
            content: "Line one\nLine two".into(),
        }
    }

    #[test]
    fn render_text() {
        assert_eq!(
            render(&document(), false).unwrap(),
            "# Plan\n\nLine one\nLine two\n"
        );
    }

    #[test]
    fn render_json() {
        let out = render(&document(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "doc-1", "title": "Plan", "content": "Line one\nLine two"})
        );
    }
}
