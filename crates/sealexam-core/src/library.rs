//! Question library loading.
//!
//! Fetches every configured bank and the blueprint concurrently. A failing
//! source is skipped and reported; it never prevents the others from
//! loading.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use crate::error::SourceError;
use crate::model::{Blueprint, Question};
use crate::parser::{parse_bank_str, parse_blueprint_str, BankParse};
use crate::traits::Source;

/// A named bank and where to fetch it from.
#[derive(Clone)]
pub struct BankSource {
    pub name: String,
    pub source: Arc<dyn Source>,
}

/// A source that could not be loaded.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub name: String,
    pub location: String,
    pub error: String,
    /// Whether retrying the load could help.
    pub retryable: bool,
}

/// What happened to the blueprint.
#[derive(Debug, Clone)]
pub enum BlueprintStatus {
    Loaded(Blueprint),
    NotConfigured,
    /// Missing or invalid; weighting is unavailable.
    Unavailable(String),
}

/// Everything loaded for a run. Immutable once built.
#[derive(Debug, Clone)]
pub struct Library {
    /// Accepted questions with unique ids, in bank order.
    pub questions: Vec<Question>,
    pub failures: Vec<SourceFailure>,
    /// Malformed records dropped across all banks.
    pub rejected: usize,
    /// Records dropped because an earlier record had the same id.
    pub duplicates: usize,
    pub blueprint: BlueprintStatus,
    pub duration_ms: u64,
}

impl Library {
    /// Build a library from already-decoded questions.
    pub fn from_questions(questions: Vec<Question>, blueprint: Option<Blueprint>) -> Self {
        let (questions, duplicates) = dedupe(questions);
        Self {
            questions,
            failures: Vec::new(),
            rejected: 0,
            duplicates,
            blueprint: match blueprint {
                Some(bp) => BlueprintStatus::Loaded(bp),
                None => BlueprintStatus::NotConfigured,
            },
            duration_ms: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn blueprint(&self) -> Option<&Blueprint> {
        match &self.blueprint {
            BlueprintStatus::Loaded(bp) => Some(bp),
            _ => None,
        }
    }

    /// Question counts per bank tag, in order of first appearance.
    pub fn bank_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for q in &self.questions {
            match counts.iter_mut().find(|(bank, _)| *bank == q.bank) {
                Some((_, n)) => *n += 1,
                None => counts.push((q.bank.clone(), 1)),
            }
        }
        counts
    }

    /// Questions whose bank is in `banks`. An empty selection means all banks.
    pub fn pool(&self, banks: &[String]) -> Vec<Question> {
        if banks.is_empty() {
            return self.questions.clone();
        }
        self.questions
            .iter()
            .filter(|q| banks.iter().any(|b| *b == q.bank))
            .cloned()
            .collect()
    }

    /// One-line summary of the bank load.
    pub fn status_line(&self) -> String {
        let mut line = format!("Question bank loaded: {} total", self.questions.len());
        for (bank, n) in self.bank_counts() {
            line.push_str(&format!(" • {bank}:{n}"));
        }
        if !self.failures.is_empty() {
            let names: Vec<&str> = self.failures.iter().map(|f| f.name.as_str()).collect();
            line.push_str(&format!(" • Missing files: {}", names.join(", ")));
        }
        line
    }

    /// One-line summary of the blueprint load.
    pub fn blueprint_status_line(&self) -> String {
        match &self.blueprint {
            BlueprintStatus::Loaded(bp) => format!(
                "Blueprint loaded: {} • Total: {}",
                bp.name, bp.total_questions
            ),
            BlueprintStatus::NotConfigured => "Blueprint: not configured.".to_string(),
            BlueprintStatus::Unavailable(_) => {
                "Blueprint: not loaded (file missing or invalid).".to_string()
            }
        }
    }
}

/// Loads banks and an optional blueprint into a [`Library`].
#[derive(Clone, Default)]
pub struct LibraryLoader {
    banks: Vec<BankSource>,
    blueprint: Option<Arc<dyn Source>>,
}

impl LibraryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bank(mut self, name: impl Into<String>, source: Arc<dyn Source>) -> Self {
        self.banks.push(BankSource {
            name: name.into(),
            source,
        });
        self
    }

    #[must_use]
    pub fn with_blueprint(mut self, source: Arc<dyn Source>) -> Self {
        self.blueprint = Some(source);
        self
    }

    /// Fetch and decode every source. Never fails as a whole.
    pub async fn load(&self) -> Library {
        let start = Instant::now();

        let bank_loads = join_all(self.banks.iter().map(|bank| async move {
            let result = bank
                .source
                .fetch()
                .await
                .and_then(|content| parse_bank_str(&content, &bank.name));
            (bank, result)
        }));
        let (bank_results, blueprint) = tokio::join!(bank_loads, self.load_blueprint());

        let mut loaded = Vec::new();
        let mut failures = Vec::new();
        let mut rejected = 0;

        for (bank, result) in bank_results {
            match result {
                Ok(BankParse {
                    questions,
                    rejected: dropped,
                }) => {
                    if dropped > 0 {
                        tracing::warn!("{}: dropped {} malformed record(s)", bank.name, dropped);
                    }
                    tracing::debug!("{}: {} question(s)", bank.name, questions.len());
                    rejected += dropped;
                    loaded.extend(questions);
                }
                Err(e) => {
                    tracing::warn!("skipping bank {} ({}): {}", bank.name, bank.source.location(), e);
                    failures.push(failure(&bank.name, bank.source.as_ref(), &e));
                }
            }
        }

        let (questions, duplicates) = dedupe(loaded);
        if duplicates > 0 {
            tracing::warn!("dropped {duplicates} question(s) with duplicate ids");
        }

        let library = Library {
            questions,
            failures,
            rejected,
            duplicates,
            blueprint,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!("{}", library.status_line());
        library
    }

    async fn load_blueprint(&self) -> BlueprintStatus {
        let Some(source) = &self.blueprint else {
            return BlueprintStatus::NotConfigured;
        };
        let result = source
            .fetch()
            .await
            .and_then(|content| parse_blueprint_str(&content));
        match result {
            Ok(bp) => {
                if !bp.is_consistent() {
                    tracing::warn!(
                        "blueprint {} task counts sum to {}, expected {}",
                        bp.name,
                        bp.count_sum(),
                        bp.total_questions
                    );
                }
                BlueprintStatus::Loaded(bp)
            }
            Err(e) => {
                tracing::warn!("blueprint not loaded ({}): {}", source.location(), e);
                BlueprintStatus::Unavailable(e.to_string())
            }
        }
    }
}

fn failure(name: &str, source: &dyn Source, error: &SourceError) -> SourceFailure {
    SourceFailure {
        name: name.to_string(),
        location: source.location(),
        error: error.to_string(),
        retryable: !error.is_permanent(),
    }
}

/// Keep the first question for each id.
fn dedupe(questions: Vec<Question>) -> (Vec<Question>, usize) {
    let total = questions.len();
    let mut seen = HashSet::new();
    let unique: Vec<Question> = questions
        .into_iter()
        .filter(|q| seen.insert(q.id.clone()))
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticSource {
        location: &'static str,
        content: Result<&'static str, u16>,
    }

    #[async_trait]
    impl Source for StaticSource {
        fn location(&self) -> String {
            self.location.to_string()
        }

        async fn fetch(&self) -> Result<String, SourceError> {
            match self.content {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(SourceError::Http {
                    status,
                    message: "unavailable".into(),
                }),
            }
        }
    }

    fn ok(location: &'static str, content: &'static str) -> Arc<dyn Source> {
        Arc::new(StaticSource {
            location,
            content: Ok(content),
        })
    }

    fn failing(location: &'static str, status: u16) -> Arc<dyn Source> {
        Arc::new(StaticSource {
            location,
            content: Err(status),
        })
    }

    const CORE: &str = r#"[
  {"id": "c1", "stem": "s", "choices": ["a", "b"], "answerIndex": 0, "taskId": "A-1"},
  {"id": "c2", "stem": "s", "choices": ["a", "b"], "answerIndex": 1},
  {"id": "bad", "stem": "s", "choices": ["a"], "answerIndex": 0}
]"#;

    const DWV: &str = r#"[
  {"id": "d1", "stem": "s", "choices": ["a", "b"], "answerIndex": 0},
  {"id": "c1", "stem": "dup", "choices": ["a", "b"], "answerIndex": 0}
]"#;

    const BLUEPRINT: &str =
        r#"{"name": "Plumber IP", "totalQuestions": 125, "tasks": [{"taskId": "A-1", "count125": 125}]}"#;

    #[tokio::test]
    async fn loads_banks_and_blueprint() {
        let library = LibraryLoader::new()
            .with_bank("core", ok("data/questions-core.json", CORE))
            .with_bank("dwv", ok("data/questions-dwv.json", DWV))
            .with_blueprint(ok("data/blueprint.json", BLUEPRINT))
            .load()
            .await;

        let ids: Vec<&str> = library.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "d1"]);
        assert_eq!(library.rejected, 1);
        assert_eq!(library.duplicates, 1);
        assert!(library.failures.is_empty());
        assert_eq!(library.blueprint().map(|b| b.name.as_str()), Some("Plumber IP"));
        assert_eq!(
            library.bank_counts(),
            vec![("core".to_string(), 2), ("dwv".to_string(), 1)]
        );
        assert_eq!(
            library.status_line(),
            "Question bank loaded: 3 total • core:2 • dwv:1"
        );
        assert_eq!(
            library.blueprint_status_line(),
            "Blueprint loaded: Plumber IP • Total: 125"
        );
    }

    #[tokio::test]
    async fn failing_sources_are_isolated() {
        let library = LibraryLoader::new()
            .with_bank("core", ok("core.json", CORE))
            .with_bank("hydronic", failing("hydronic.json", 404))
            .with_bank("math", ok("math.json", "not json"))
            .with_blueprint(failing("blueprint.json", 503))
            .load()
            .await;

        assert_eq!(library.questions.len(), 2);
        assert_eq!(library.failures.len(), 2);
        assert_eq!(library.failures[0].name, "hydronic");
        assert!(library.failures[0].retryable);
        assert_eq!(library.failures[1].name, "math");
        assert!(!library.failures[1].retryable);
        assert!(library.status_line().ends_with("Missing files: hydronic, math"));
        assert!(library.blueprint().is_none());
        assert_eq!(
            library.blueprint_status_line(),
            "Blueprint: not loaded (file missing or invalid)."
        );
    }

    #[tokio::test]
    async fn invalid_blueprint_disables_weighting() {
        let library = LibraryLoader::new()
            .with_bank("core", ok("core.json", CORE))
            .with_blueprint(ok("bp.json", r#"{"name": "x"}"#))
            .load()
            .await;
        assert!(matches!(library.blueprint, BlueprintStatus::Unavailable(_)));
    }

    #[tokio::test]
    async fn nothing_configured() {
        let library = LibraryLoader::new().load().await;
        assert!(library.is_empty());
        assert!(matches!(library.blueprint, BlueprintStatus::NotConfigured));
    }

    #[test]
    fn pool_filters_by_bank() {
        let library = Library::from_questions(
            vec![
                crate::model::fixtures::question("a", "core", None),
                crate::model::fixtures::question("b", "dwv", None),
                crate::model::fixtures::question("c", "core", None),
                crate::model::fixtures::question("a", "math", None),
            ],
            None,
        );
        assert_eq!(library.duplicates, 1);
        assert_eq!(library.pool(&["core".into()]).len(), 2);
        assert_eq!(library.pool(&["dwv".into(), "core".into()]).len(), 3);
        assert_eq!(library.pool(&[]).len(), 3);
        assert!(library.pool(&["safety".into()]).is_empty());
    }
}
