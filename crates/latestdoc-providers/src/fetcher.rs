//! The latest-document fetch: one list call, one get call, one flatten.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use latestdoc_core::{Document, DriveFileSummary, FlattenedDocument};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future used by the object-safe async traits of this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which timestamp "latest" refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// Newest by creation time.
    #[default]
    CreatedTime,
    /// Newest by last modification.
    ModifiedTime,
}

impl OrderBy {
    /// Returns the Drive `orderBy` query value.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::CreatedTime => "createdTime desc",
            Self::ModifiedTime => "modifiedTime desc",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedTime => "created_time",
            Self::ModifiedTime => "modified_time",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_time" | "created" | "createdTime" => Ok(Self::CreatedTime),
            "modified_time" | "modified" | "modifiedTime" => Ok(Self::ModifiedTime),
            other => Err(ProviderError::configuration(format!(
                "unknown order_by '{other}' (expected created_time or modified_time)"
            ))),
        }
    }
}

/// Remote operations the fetcher needs.
///
/// Implemented over HTTP by [`GoogleDocsClient`](crate::google::GoogleDocsClient).
pub trait DocumentSource: Send + Sync {
    /// Lists Google Docs files, newest first by `order_by`, at most one.
    fn list_latest(&self, order_by: OrderBy) -> BoxFuture<'_, ProviderResult<Vec<DriveFileSummary>>>;

    /// Fetches the structured body of a document.
    fn get_document<'a>(&'a self, document_id: &'a str) -> BoxFuture<'a, ProviderResult<Document>>;
}

/// Fetches the newest document and flattens its body to plain text.
///
/// # Errors
///
/// `NoDocumentsFound` when the list is empty (no get call is made); any error
/// of the source is returned unchanged.
pub async fn fetch_latest_document(
    source: &dyn DocumentSource,
    order_by: OrderBy,
) -> ProviderResult<FlattenedDocument> {
    let files = source.list_latest(order_by).await?;
    let Some(file) = files.into_iter().next() else {
        return Err(ProviderError::no_documents("No Google Docs files found."));
    };

    info!(id = %file.id, name = %file.name, "latest document selected");

    let document = source.get_document(&file.id).await?;
    let flattened = FlattenedDocument::from_parts(&file, &document);

    debug!(
        id = %flattened.id,
        chars = flattened.content.chars().count(),
        "document flattened"
    );
    Ok(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use latestdoc_core::{Body, StructuralElement};
    use std::sync::Mutex;

    /// Records every call so tests can assert on exactly what was requested.
    #[derive(Default)]
    struct FakeSource {
        files: Vec<DriveFileSummary>,
        document: Document,
        list_calls: Mutex<Vec<OrderBy>>,
        get_calls: Mutex<Vec<String>>,
        fail_get: bool,
    }

    impl DocumentSource for FakeSource {
        fn list_latest(
            &self,
            order_by: OrderBy,
        ) -> BoxFuture<'_, ProviderResult<Vec<DriveFileSummary>>> {
            Box::pin(async move {
                self.list_calls.lock().unwrap().push(order_by);
                Ok(self.files.clone())
            })
        }

        fn get_document<'a>(
            &'a self,
            document_id: &'a str,
        ) -> BoxFuture<'a, ProviderResult<Document>> {
            Box::pin(async move {
                self.get_calls.lock().unwrap().push(document_id.to_string());
                if self.fail_get {
                    return Err(ProviderError::remote_call("Docs API error (500)"));
                }
                Ok(self.document.clone())
            })
        }
    }

    fn summary(id: &str, name: &str) -> DriveFileSummary {
        DriveFileSummary {
            id: id.to_string(),
            name: name.to_string(),
            created_time: Some("2026-10-01T09:00:00.000Z".to_string()),
            modified_time: None,
        }
    }

    fn document(title: Option<&str>, body: Body) -> Document {
        Document {
            document_id: "doc-1".to_string(),
            title: title.map(String::from),
            body: Some(body),
        }
    }

    #[tokio::test]
    async fn empty_list_fails_without_get() {
        let source = FakeSource::default();

        let err = fetch_latest_document(&source, OrderBy::CreatedTime)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ProviderErrorCode::NoDocumentsFound);
        assert!(source.get_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_file_is_fetched_once_and_flattened() {
        let source = FakeSource {
            files: vec![summary("doc-1", "Plan.gdoc")],
            document: document(
                Some("Plan"),
                Body {
                    content: vec![
                        StructuralElement::paragraph(["Hello ", "world\n"]),
                        StructuralElement::non_paragraph(),
                        StructuralElement::paragraph(["Bye\n"]),
                    ],
                },
            ),
            ..FakeSource::default()
        };

        let doc = fetch_latest_document(&source, OrderBy::CreatedTime)
            .await
            .unwrap();

        assert_eq!(*source.get_calls.lock().unwrap(), vec!["doc-1".to_string()]);
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.title, "Plan");
        assert_eq!(doc.content, "Hello world\nBye\n");
    }

    #[tokio::test]
    async fn order_is_passed_to_source() {
        let source = FakeSource {
            files: vec![summary("d", "n")],
            document: document(Some("t"), Body::default()),
            ..FakeSource::default()
        };

        fetch_latest_document(&source, OrderBy::ModifiedTime)
            .await
            .unwrap();

        assert_eq!(
            *source.list_calls.lock().unwrap(),
            vec![OrderBy::ModifiedTime]
        );
    }

    #[tokio::test]
    async fn missing_title_falls_back_to_file_name() {
        let source = FakeSource {
            files: vec![summary("doc-9", "Untitled notes")],
            document: document(None, Body::default()),
            ..FakeSource::default()
        };

        let doc = fetch_latest_document(&source, OrderBy::CreatedTime)
            .await
            .unwrap();
        assert_eq!(doc.title, "Untitled notes");
        assert_eq!(doc.content, "");
    }

    #[tokio::test]
    async fn get_failure_propagates() {
        let source = FakeSource {
            files: vec![summary("doc-1", "x")],
            fail_get: true,
            ..FakeSource::default()
        };

        let err = fetch_latest_document(&source, OrderBy::CreatedTime)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RemoteCallFailed);
    }

    #[test]
    fn order_by_query_values() {
        assert_eq!(OrderBy::default(), OrderBy::CreatedTime);
        assert_eq!(OrderBy::CreatedTime.as_query(), "createdTime desc");
        assert_eq!(OrderBy::ModifiedTime.as_query(), "modifiedTime desc");
    }

    #[test]
    fn order_by_parses_config_names() {
        assert_eq!("created_time".parse::<OrderBy>().unwrap(), OrderBy::CreatedTime);
        assert_eq!("modified".parse::<OrderBy>().unwrap(), OrderBy::ModifiedTime);
        assert!("newest".parse::<OrderBy>().is_err());
        assert_eq!(OrderBy::ModifiedTime.to_string(), "modified_time");
    }
}
