//! Tool descriptors, service metadata and invocation outcomes.

use latestdoc_core::FlattenedDocument;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Static description of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    /// JSON schema of the accepted input.
    pub input_schema: Value,
    /// JSON schema of `data` in a success outcome.
    pub output_schema: Value,
}

impl ToolDescriptor {
    /// Describes the `get-latest-document` tool.
    pub fn latest_document() -> Self {
        Self {
            id: "get-latest-document".to_string(),
            name: "Get Latest Google Drive Document".to_string(),
            description: "Retrieves the content of the most recently modified Google Doc"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
            }),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "title": { "type": "string" },
                    "content": { "type": "string" },
                },
                "required": ["title", "content"],
            }),
        }
    }
}

/// Metadata describing the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub title: String,
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ServiceInfo {
    /// Metadata for the Google Drive integration service.
    pub fn google_drive(version: impl Into<String>) -> Self {
        Self {
            title: "Google Drive Integration Service".to_string(),
            description: "A service to interact with Google Drive".to_string(),
            version: version.into(),
            tags: vec!["google-drive".to_string()],
        }
    }
}

/// Card shown to the user by the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub content: String,
}

/// Result of one tool invocation.
///
/// Failures are values, so the hosting runtime never has to handle a raw
/// error from the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success {
        /// One-line summary for the agent.
        text: String,
        data: Value,
        ui: Card,
    },
    Failure {
        text: String,
        /// `{ "error": <message> }`
        data: Value,
    },
}

impl ToolOutcome {
    /// Builds the success outcome for a fetched document.
    pub fn document(document: &FlattenedDocument) -> Self {
        Self::Success {
            text: format!("Retrieved latest document: {}", document.title),
            data: json!({
                "id": document.id,
                "title": document.title,
                "content": document.content,
            }),
            ui: Card {
                title: "Latest Google Drive Document".to_string(),
                content: format!("Retrieved: {}", document.title),
            },
        }
    }

    /// Builds the failure outcome carrying `error` as its message.
    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self::Failure {
            text: "Failed to retrieve latest document".to_string(),
            data: json!({ "error": error.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the summary text of either variant.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { text, .. } | Self::Failure { text, .. } => text,
        }
    }

    /// Returns the structured data of either variant.
    pub fn data(&self) -> &Value {
        match self {
            Self::Success { data, .. } | Self::Failure { data, .. } => data,
        }
    }
}
