//! Core trait definitions for document sources.
//!
//! These async traits are implemented by the `sealexam-sources` crate for
//! local files and HTTP, and by in-memory mocks in tests.

use async_trait::async_trait;

use crate::error::SourceError;

/// Something that can produce the raw text of a bank or blueprint document.
#[async_trait]
pub trait Source: Send + Sync {
    /// Where the document lives (path or URL), for status messages.
    fn location(&self) -> String;

    /// Fetch the whole document.
    async fn fetch(&self) -> Result<String, SourceError>;
}
