//! In-memory source for tests and demos.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use sealexam_core::error::SourceError;
use sealexam_core::traits::Source;

enum Outcome {
    Content(String),
    Missing,
    Unreachable,
    Status(u16),
}

/// A source that returns canned content or a canned failure.
pub struct MockSource {
    location: String,
    outcome: Outcome,
    /// Number of fetches made.
    fetch_count: AtomicU32,
}

impl MockSource {
    fn new(location: &str, outcome: Outcome) -> Self {
        Self {
            location: location.to_string(),
            outcome,
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Always returns `content`.
    pub fn with_content(location: &str, content: &str) -> Self {
        Self::new(location, Outcome::Content(content.to_string()))
    }

    /// Always fails with `SourceError::NotFound`.
    pub fn missing(location: &str) -> Self {
        Self::new(location, Outcome::Missing)
    }

    /// Always fails with a network error.
    pub fn unreachable(location: &str) -> Self {
        Self::new(location, Outcome::Unreachable)
    }

    /// Always fails with the given HTTP status.
    pub fn with_status(location: &str, status: u16) -> Self {
        Self::new(location, Outcome::Status(status))
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Source for MockSource {
    fn location(&self) -> String {
        self.location.clone()
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        match &self.outcome {
            Outcome::Content(content) => Ok(content.clone()),
            Outcome::Missing => Err(SourceError::NotFound(self.location.clone())),
            Outcome::Unreachable => Err(SourceError::Network(format!(
                "{} not reachable",
                self.location
            ))),
            Outcome::Status(status) => Err(SourceError::Http {
                status: *status,
                message: String::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use sealexam_core::library::{BlueprintStatus, LibraryLoader};

    const CORE: &str = r#"[
        {"id":"c1","stem":"Trap seal depth?","choices":["25 mm","50 mm"],"answerIndex":1,"taskId":"A-1"},
        {"id":"c2","stem":"Vent size?","choices":["32","40"],"answerIndex":0},
        {"id":"bad","stem":"No choices"}
    ]"#;
    const DWV: &str = r#"[
        {"id":"c1","stem":"Duplicate id","choices":["x","y"],"answerIndex":0},
        {"id":"d1","stem":"Cleanout spacing?","choices":["15 m","30 m"],"answerIndex":0}
    ]"#;
    const BLUEPRINT: &str = r#"{"name":"Plumber","totalQuestions":125,"tasks":[{"taskId":"A-1","title":"Safety","count125":125}]}"#;

    #[tokio::test]
    async fn counts_fetches() {
        let source = MockSource::with_content("mem://core", "[]");
        source.fetch().await.unwrap();
        source.fetch().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failures_map_to_source_errors() {
        assert!(matches!(
            MockSource::missing("mem://x").fetch().await,
            Err(SourceError::NotFound(_))
        ));
        assert!(matches!(
            MockSource::unreachable("mem://x").fetch().await,
            Err(SourceError::Network(_))
        ));
        assert!(matches!(
            MockSource::with_status("mem://x", 500).fetch().await,
            Err(SourceError::Http { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn loader_isolates_failing_sources() {
        let core = Arc::new(MockSource::with_content("mem://core", CORE));
        let math = Arc::new(MockSource::missing("mem://math"));
        let tools = Arc::new(MockSource::unreachable("mem://tools"));

        let library = LibraryLoader::new()
            .with_bank("core", core.clone())
            .with_bank("dwv", Arc::new(MockSource::with_content("mem://dwv", DWV)))
            .with_bank("math", math.clone())
            .with_bank("tools", tools)
            .with_blueprint(Arc::new(MockSource::with_content("mem://bp", BLUEPRINT)))
            .load()
            .await;

        assert_eq!(core.fetch_count(), 1);
        assert_eq!(math.fetch_count(), 1);

        let ids: Vec<&str> = library.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "d1"]);
        assert_eq!(library.rejected, 1);
        assert_eq!(library.duplicates, 1);

        assert_eq!(library.failures.len(), 2);
        assert_eq!(library.failures[0].name, "math");
        assert!(!library.failures[0].retryable);
        assert_eq!(library.failures[1].name, "tools");
        assert!(library.failures[1].retryable);

        assert!(matches!(library.blueprint, BlueprintStatus::Loaded(_)));
    }
}
