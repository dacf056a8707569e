//! Local file source.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use sealexam_core::error::SourceError;
use sealexam_core::traits::Source;

/// Reads a bank or blueprint document from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Source for FileSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SourceError::NotFound(self.location())),
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}
