//! Core types: document model, text flattening, tracing setup

pub mod document;
pub mod tracing;

pub use document::{
    Body, Document, DriveFileSummary, FlattenedDocument, Paragraph, ParagraphElement,
    StructuralElement, TextRun, flatten_body,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
