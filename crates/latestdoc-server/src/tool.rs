//! Tools exposed by the server and the registry that dispatches to them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use latestdoc_core::FlattenedDocument;
use latestdoc_protocol::{ToolDescriptor, ToolOutcome};
use latestdoc_providers::google::CredentialManager;
use latestdoc_providers::{BoxFuture, OrderBy, ProviderResult, fetch_latest_document};

/// A callable tool.
///
/// Implementations never fail: errors are folded into a
/// [`ToolOutcome::Failure`].
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    /// Runs the tool. `input` has already been checked to be a JSON object.
    fn call<'a>(&'a self, input: &'a Value) -> BoxFuture<'a, ToolOutcome>;
}

/// Tools keyed by id.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a tool, replacing any tool with the same id.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.register(Arc::new(tool));
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let id = tool.descriptor().id;
        if self.tools.insert(id.clone(), tool).is_some() {
            warn!(tool = %id, "Replacing registered tool");
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(id)
    }

    /// Descriptors of all tools, ordered by id.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|tool| tool.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Source of the newest flattened document.
pub trait DocumentFetcher: Send + Sync {
    fn fetch_latest(&self) -> BoxFuture<'_, ProviderResult<FlattenedDocument>>;
}

/// Fetches through Google Drive and Docs using managed credentials.
pub struct GoogleDriveFetcher {
    manager: Arc<CredentialManager>,
    order_by: OrderBy,
}

impl GoogleDriveFetcher {
    /// Uses the ordering configured on the manager.
    pub fn new(manager: Arc<CredentialManager>) -> Self {
        let order_by = manager.config().order_by;
        Self { manager, order_by }
    }
}

impl DocumentFetcher for GoogleDriveFetcher {
    fn fetch_latest(&self) -> BoxFuture<'_, ProviderResult<FlattenedDocument>> {
        Box::pin(async move {
            let client = self.manager.acquire_client().await?;
            fetch_latest_document(&client, self.order_by).await
        })
    }
}

/// The `get-latest-document` tool.
pub struct LatestDocumentTool {
    fetcher: Arc<dyn DocumentFetcher>,
}

impl LatestDocumentTool {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { fetcher }
    }

    /// Convenience constructor over [`GoogleDriveFetcher`].
    pub fn google(manager: Arc<CredentialManager>) -> Self {
        Self::new(Arc::new(GoogleDriveFetcher::new(manager)))
    }
}

impl Tool for LatestDocumentTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::latest_document()
    }

    fn call<'a>(&'a self, _input: &'a Value) -> BoxFuture<'a, ToolOutcome> {
        Box::pin(async move {
            match self.fetcher.fetch_latest().await {
                Ok(document) => {
                    info!(id = %document.id, title = %document.title, "Latest document retrieved");
                    ToolOutcome::document(&document)
                }
                Err(e) => {
                    warn!(code = %e.code(), error = %e, "Failed to retrieve latest document");
                    ToolOutcome::failure(&e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latestdoc_providers::ProviderError;
    use latestdoc_providers::google::{DisabledPrompt, GoogleConfig};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeFetcher {
        result: ProviderResult<FlattenedDocument>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn ok(id: &str, title: &str, content: &str) -> Self {
            Self {
                result: Ok(FlattenedDocument {
                    id: id.to_string(),
                    title: title.to_string(),
                    content: content.to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn err(error: ProviderError) -> Self {
            Self {
                result: Err(error),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentFetcher for FakeFetcher {
        fn fetch_latest(&self) -> BoxFuture<'_, ProviderResult<FlattenedDocument>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match &self.result {
                Ok(doc) => Ok(doc.clone()),
                Err(e) => Err(ProviderError::new(e.code(), e.message())),
            };
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn success_outcome_carries_document() {
        let fetcher = Arc::new(FakeFetcher::ok("doc-1", "Plan", "Hello\n"));
        let tool = LatestDocumentTool::new(fetcher.clone());

        let outcome = tool.call(&json!({})).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(outcome.is_success());
        assert_eq!(outcome.text(), "Retrieved latest document: Plan");
        assert_eq!(
            outcome.data(),
            &json!({"id": "doc-1", "title": "Plan", "content": "Hello\n"})
        );
    }

    #[tokio::test]
    async fn provider_error_becomes_failure_outcome() {
        let tool = LatestDocumentTool::new(Arc::new(FakeFetcher::err(ProviderError::no_documents(
            "No Google Docs files found.",
        ))));

        let outcome = tool.call(&json!({})).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.text(), "Failed to retrieve latest document");
        let error = outcome.data()["error"].as_str().unwrap();
        assert!(error.contains("No Google Docs files found."));
    }

    #[tokio::test]
    async fn missing_credential_file_fails_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let config = GoogleConfig::new()
            .with_credentials_file(dir.path().join("credentials.json"))
            .with_token_path(dir.path().join("token.json"));
        let manager =
            Arc::new(CredentialManager::from_config(config, Arc::new(DisabledPrompt)).unwrap());

        let outcome = LatestDocumentTool::google(manager).call(&json!({})).await;
        assert!(!outcome.is_success());
        let error = outcome.data()["error"].as_str().unwrap();
        assert!(error.contains("credential_file_missing"));
        assert!(!dir.path().join("token.json").exists());
    }

    #[test]
    fn registry_lists_descriptors_by_id() {
        let registry = ToolRegistry::new().with_tool(LatestDocumentTool::new(Arc::new(
            FakeFetcher::ok("a", "b", "c"),
        )));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("get-latest-document").is_some());
        assert!(registry.get("nope").is_none());
        assert_eq!(registry.descriptors(), vec![ToolDescriptor::latest_document()]);
    }
}
