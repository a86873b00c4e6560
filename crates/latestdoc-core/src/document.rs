//! Google Docs document model and plain-text flattening.
//!
//! The Docs API returns a document body as an ordered list of structural
//! elements. Only paragraphs carry text we care about; each paragraph holds an
//! ordered list of elements, and text runs are the atomic unit of text:
//!
//! ```text
//! Body
//!  └─ StructuralElement*   (paragraph | table | sectionBreak | tableOfContents)
//!      └─ Paragraph
//!          └─ ParagraphElement*   (textRun | inlineObjectElement | ...)
//!              └─ TextRun { content }
//! ```
//!
//! Everything that is not a paragraph text run is ignored while the shapes
//! are deserialized, so [`flatten_body`] never has to reject input.

use serde::{Deserialize, Serialize};

/// A document as returned by `documents.get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The document ID.
    #[serde(default)]
    pub document_id: String,
    /// The document title.
    #[serde(default)]
    pub title: Option<String>,
    /// The main body, absent for some empty documents.
    #[serde(default)]
    pub body: Option<Body>,
}

impl Document {
    /// Returns the flattened plain text of the body.
    pub fn plain_text(&self) -> String {
        self.body.as_ref().map(flatten_body).unwrap_or_default()
    }
}

/// The document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// One top-level element of the body.
///
/// Tables, section breaks and tables of contents deserialize with
/// `paragraph: None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub paragraph: Option<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

/// One element inside a paragraph; only text runs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub text_run: Option<TextRun>,
}

/// A contiguous span of styled text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    /// The raw text, including any embedded newline.
    #[serde(default)]
    pub content: Option<String>,
}

impl StructuralElement {
    /// Creates a paragraph element from text-run fragments.
    pub fn paragraph<I, S>(runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paragraph: Some(Paragraph {
                elements: runs
                    .into_iter()
                    .map(|s| ParagraphElement {
                        text_run: Some(TextRun {
                            content: Some(s.into()),
                        }),
                    })
                    .collect(),
            }),
        }
    }

    /// Creates an element that carries no paragraph (table, section break...).
    pub fn non_paragraph() -> Self {
        Self { paragraph: None }
    }
}

/// Concatenates every text run of `body`, in document order.
///
/// No separator is inserted: fragments already include the newlines the
/// source used.
pub fn flatten_body(body: &Body) -> String {
    let mut content = String::new();
    for element in &body.content {
        let Some(paragraph) = &element.paragraph else {
            continue;
        };
        for el in &paragraph.elements {
            if let Some(text) = el.text_run.as_ref().and_then(|run| run.content.as_deref()) {
                content.push_str(text);
            }
        }
    }
    content
}

/// The newest document picked by the Drive `files.list` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

/// The result handed back to the tool caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedDocument {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl FlattenedDocument {
    /// Builds the flattened form of `document`, using `file`'s name when the
    /// document has no title.
    pub fn from_parts(file: &DriveFileSummary, document: &Document) -> Self {
        let title = document
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file.name.clone());

        Self {
            id: file.id.clone(),
            title,
            content: document.plain_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(content: Vec<StructuralElement>) -> Body {
        Body { content }
    }

    #[test]
    fn flatten_concatenates_runs_in_order() {
        let b = body(vec![
            StructuralElement::paragraph(["Hello, ", "world"]),
            StructuralElement::paragraph(["!\n"]),
            StructuralElement::paragraph(["Second line\n"]),
        ]);
        assert_eq!(flatten_body(&b), "Hello, world!\nSecond line\n");
    }

    #[test]
    fn flatten_is_pure() {
        let b = body(vec![
            StructuralElement::paragraph(["a", "b"]),
            StructuralElement::paragraph(["c\n"]),
        ]);
        assert_eq!(flatten_body(&b), flatten_body(&b));
    }

    #[test]
    fn flatten_skips_non_paragraph_elements() {
        let b = body(vec![
            StructuralElement::non_paragraph(),
            StructuralElement::paragraph(["first\n"]),
            StructuralElement::non_paragraph(),
            StructuralElement::paragraph(["second\n"]),
            StructuralElement::non_paragraph(),
        ]);
        assert_eq!(flatten_body(&b), "first\nsecond\n");
    }

    #[test]
    fn flatten_empty_body() {
        assert_eq!(flatten_body(&Body::default()), "");
    }

    #[test]
    fn flatten_does_not_add_separators() {
        let b = body(vec![
            StructuralElement::paragraph(["no newline"]),
            StructuralElement::paragraph(["glued"]),
        ]);
        assert_eq!(flatten_body(&b), "no newlineglued");
    }

    #[test]
    fn parse_api_document_with_table_and_inline_object() {
        let json = r#"{
            "documentId": "doc-1",
            "title": "Meeting notes",
            "body": {
                "content": [
                    { "endIndex": 1, "sectionBreak": { "sectionStyle": {} } },
                    {
                        "paragraph": {
                            "elements": [
                                { "textRun": { "content": "Agenda\n", "textStyle": { "bold": true } } }
                            ],
                            "paragraphStyle": { "namedStyleType": "HEADING_1" }
                        }
                    },
                    {
                        "table": {
                            "tableRows": [
                                { "tableCells": [ { "content": [
                                    { "paragraph": { "elements": [ { "textRun": { "content": "cell\n" } } ] } }
                                ] } ] }
                            ]
                        }
                    },
                    {
                        "paragraph": {
                            "elements": [
                                { "inlineObjectElement": { "inlineObjectId": "img-1" } },
                                { "textRun": { "content": "Item one\n" } },
                                { "textRun": {} }
                            ]
                        }
                    }
                ]
            }
        }"#;

        let document: Document = serde_json::from_str(json).unwrap();
        assert_eq!(document.document_id, "doc-1");
        assert_eq!(document.title.as_deref(), Some("Meeting notes"));
        assert_eq!(document.body.as_ref().unwrap().content.len(), 4);
        assert_eq!(document.plain_text(), "Agenda\nItem one\n");
    }

    #[test]
    fn parse_document_without_body() {
        let document: Document =
            serde_json::from_str(r#"{ "documentId": "x", "title": "Empty" }"#).unwrap();
        assert_eq!(document.plain_text(), "");
    }

    #[test]
    fn flattened_document_uses_drive_name_without_title() {
        let file = DriveFileSummary {
            id: "file-7".to_string(),
            name: "Untitled doc".to_string(),
            created_time: None,
            modified_time: None,
        };
        let document = Document {
            document_id: "file-7".to_string(),
            title: None,
            body: Some(body(vec![StructuralElement::paragraph(["text\n"])])),
        };

        let flat = FlattenedDocument::from_parts(&file, &document);
        assert_eq!(flat.id, "file-7");
        assert_eq!(flat.title, "Untitled doc");
        assert_eq!(flat.content, "text\n");
    }

    #[test]
    fn flattened_document_json_shape() {
        let flat = FlattenedDocument {
            id: "abc".to_string(),
            title: "Notes".to_string(),
            content: "Hi\n".to_string(),
        };
        insta::assert_json_snapshot!(flat, @r#"
        {
          "id": "abc",
          "title": "Notes",
          "content": "Hi\n"
        }
        "#);
    }

    #[test]
    fn parse_drive_file_summary() {
        let json = r#"{
            "id": "1AbC",
            "name": "Plan",
            "createdTime": "2024-03-15T10:00:00.000Z"
        }"#;
        let file: DriveFileSummary = serde_json::from_str(json).unwrap();
        assert_eq!(file.id, "1AbC");
        assert_eq!(file.name, "Plan");
        assert_eq!(file.created_time.as_deref(), Some("2024-03-15T10:00:00.000Z"));
        assert!(file.modified_time.is_none());
    }
}
