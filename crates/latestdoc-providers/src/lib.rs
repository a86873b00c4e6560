//! Google credential management and latest-document retrieval.
//!
//! - [`google::CredentialManager`] - turns the credential file and persisted
//!   token into an authenticated [`google::GoogleDocsClient`]
//! - [`DocumentSource`] - the two remote calls the fetcher needs
//! - [`fetch_latest_document`] - list, get, flatten
//! - [`ProviderError`] - error type shared by all of the above
//!
//! # Architecture
//!
//! ```text
//! credentials.json ──┐
//!                    ▼
//!  token.json ◄── CredentialManager ──► ConsentPrompt (first run)
//!                    │
//!                    ▼
//!            GoogleDocsClient  (DocumentSource)
//!                    │  files.list, documents.get
//!                    ▼
//!          fetch_latest_document ──► FlattenedDocument
//! ```

pub mod error;
pub mod fetcher;
pub mod google;

#[cfg(test)]
mod test_support;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use fetcher::{BoxFuture, DocumentSource, OrderBy, fetch_latest_document};
