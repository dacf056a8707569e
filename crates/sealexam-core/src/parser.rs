//! JSON question bank and blueprint parser.
//!
//! Decodes bank documents record by record so one bad record never fails a
//! whole bank, decodes blueprint documents, and validates loaded data.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::error::SourceError;
use crate::model::{Blueprint, Confidence, Question, Reference};

/// Outcome of decoding one bank document.
#[derive(Debug, Clone, Default)]
pub struct BankParse {
    /// Records that passed validation, in document order.
    pub questions: Vec<Question>,
    /// Number of records dropped as malformed.
    pub rejected: usize,
}

/// Parse a bank document: a JSON array of question records.
///
/// `source_name` tags questions that carry neither `bank` nor `category`.
pub fn parse_bank_str(content: &str, source_name: &str) -> Result<BankParse, SourceError> {
    let value: Value = serde_json::from_str(content)?;
    let records = value
        .as_array()
        .ok_or_else(|| SourceError::Schema("expected a JSON array of questions".into()))?;

    let mut parsed = BankParse::default();
    for record in records {
        match question_from_value(record, source_name) {
            Some(q) => parsed.questions.push(q),
            None => {
                tracing::debug!(source = source_name, "dropping malformed question record");
                parsed.rejected += 1;
            }
        }
    }
    Ok(parsed)
}

/// Read and parse a bank file from disk.
pub fn parse_bank_file(path: &Path, source_name: &str) -> Result<BankParse> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;
    parse_bank_str(&content, source_name)
        .with_context(|| format!("failed to parse bank: {}", path.display()))
}

/// Convert one JSON record into a question.
///
/// A record is accepted only if it has a string `id`, a string `stem`, at
/// least two string `choices` and a non-negative integer `answerIndex`.
/// Optional fields that are present but of the wrong type are ignored.
///
/// Only the sign of `answerIndex` is checked here. An index past the last
/// choice still yields a question, one that no answer can score, and
/// [`validate_questions`] reports it so bank authors can fix the record.
pub fn question_from_value(value: &Value, source_name: &str) -> Option<Question> {
    let obj = value.as_object()?;

    let id = obj.get("id")?.as_str()?.to_string();
    let stem = obj.get("stem")?.as_str()?.to_string();
    let choices = obj
        .get("choices")?
        .as_array()?
        .iter()
        .map(|c| c.as_str().map(String::from))
        .collect::<Option<Vec<_>>>()?;
    if choices.len() < 2 {
        return None;
    }
    let answer_index = usize::try_from(obj.get("answerIndex")?.as_i64()?).ok()?;

    let category = opt_string(obj, "category");
    let bank = opt_string(obj, "bank")
        .or_else(|| category.clone())
        .unwrap_or_else(|| source_name.to_string());

    let references = obj
        .get("references")
        .and_then(Value::as_array)
        .map(|refs| refs.iter().filter_map(reference_from_value).collect())
        .unwrap_or_default();

    Some(Question {
        id,
        stem,
        choices,
        answer_index,
        bank,
        category,
        task_id: opt_string(obj, "taskId"),
        difficulty: opt_string(obj, "difficulty"),
        explanation: opt_string(obj, "explanation"),
        references,
    })
}

fn reference_from_value(value: &Value) -> Option<Reference> {
    let obj = value.as_object()?;
    Some(Reference {
        code: opt_string(obj, "code").unwrap_or_else(|| "Reference".to_string()),
        location: opt_string(obj, "location").unwrap_or_default(),
        note: opt_string(obj, "note").unwrap_or_default(),
        confidence: obj
            .get("confidence")
            .and_then(Value::as_str)
            .and_then(|c| c.parse().ok())
            .unwrap_or(Confidence::NeedsVerify),
    })
}

fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// Parse a blueprint document.
///
/// The document must be an object with a `tasks` array and a numeric
/// `totalQuestions`; anything else is a schema error.
pub fn parse_blueprint_str(content: &str) -> Result<Blueprint, SourceError> {
    let value: Value = serde_json::from_str(content)?;

    let obj = value
        .as_object()
        .ok_or_else(|| SourceError::Schema("blueprint must be a JSON object".into()))?;
    if !obj.get("tasks").is_some_and(Value::is_array) {
        return Err(SourceError::Schema("blueprint has no tasks array".into()));
    }
    if !obj.get("totalQuestions").is_some_and(Value::is_number) {
        return Err(SourceError::Schema(
            "blueprint has no numeric totalQuestions".into(),
        ));
    }

    serde_json::from_value(value).map_err(|e| SourceError::Schema(e.to_string()))
}

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate loaded questions, and the blueprint if one is given, for
/// problems that do not stop a session from running.
pub fn validate_questions(
    questions: &[Question],
    blueprint: Option<&Blueprint>,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = HashSet::new();
    for q in questions {
        if !seen_ids.insert(q.id.as_str()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in questions {
        if q.answer_index >= q.choices.len() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!(
                    "answerIndex {} is out of range for {} choices",
                    q.answer_index,
                    q.choices.len()
                ),
            });
        }
        if q.stem.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "stem is empty".into(),
            });
        }
    }

    if let Some(bp) = blueprint {
        for q in questions {
            if let Some(task_id) = &q.task_id {
                if bp.task(task_id).is_none() {
                    warnings.push(ValidationWarning {
                        question_id: Some(q.id.clone()),
                        message: format!("taskId {task_id} is not in the blueprint"),
                    });
                }
            }
        }

        let mut seen_tasks = HashSet::new();
        for task in &bp.tasks {
            if !seen_tasks.insert(task.task_id.as_str()) {
                warnings.push(ValidationWarning {
                    question_id: None,
                    message: format!("duplicate blueprint task: {}", task.task_id),
                });
            }
        }

        if !bp.is_consistent() {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!(
                    "blueprint task counts sum to {}, expected {}",
                    bp.count_sum(),
                    bp.total_questions
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    const VALID_BANK: &str = r#"[
  {
    "id": "core-001",
    "bank": "core",
    "category": "Codes",
    "taskId": "A-1",
    "difficulty": "medium",
    "stem": "What is the minimum trap seal depth?",
    "choices": ["25 mm", "38 mm", "50 mm", "75 mm"],
    "answerIndex": 1,
    "explanation": "Trap seals must be at least 38 mm.",
    "references": [
      {"code": "NPC 2020", "location": "2.5.1.1", "note": "Trap seal", "confidence": "verified"},
      {"location": "Table 2.4.10.6"}
    ]
  },
  {
    "id": "core-002",
    "stem": "Which fitting changes direction by 45 degrees?",
    "choices": ["Eighth bend", "Quarter bend"],
    "answerIndex": 0
  }
]"#;

    #[test]
    fn parse_valid_bank() {
        let parsed = parse_bank_str(VALID_BANK, "core").unwrap();
        assert_eq!(parsed.rejected, 0);
        assert_eq!(parsed.questions.len(), 2);

        let q = &parsed.questions[0];
        assert_eq!(q.id, "core-001");
        assert_eq!(q.answer_index, 1);
        assert_eq!(q.task_id.as_deref(), Some("A-1"));
        assert_eq!(q.difficulty.as_deref(), Some("medium"));
        assert_eq!(q.references.len(), 2);
        assert_eq!(q.references[0].confidence, Confidence::Verified);
        assert_eq!(q.references[1].code, "Reference");
        assert_eq!(q.references[1].confidence, Confidence::NeedsVerify);
    }

    #[test]
    fn bank_tag_falls_back_to_category_then_source() {
        let json = r#"[
  {"id": "a", "stem": "s", "choices": ["x", "y"], "answerIndex": 0, "bank": "dwv", "category": "Drainage"},
  {"id": "b", "stem": "s", "choices": ["x", "y"], "answerIndex": 0, "category": "hydronic"},
  {"id": "c", "stem": "s", "choices": ["x", "y"], "answerIndex": 0}
]"#;
        let parsed = parse_bank_str(json, "safety").unwrap();
        let banks: Vec<&str> = parsed.questions.iter().map(|q| q.bank.as_str()).collect();
        assert_eq!(banks, vec!["dwv", "hydronic", "safety"]);
    }

    #[test]
    fn malformed_records_are_dropped() {
        let json = r#"[
  {"id": "ok", "stem": "s", "choices": ["x", "y"], "answerIndex": 1},
  {"stem": "no id", "choices": ["x", "y"], "answerIndex": 0},
  {"id": 7, "stem": "numeric id", "choices": ["x", "y"], "answerIndex": 0},
  {"id": "one-choice", "stem": "s", "choices": ["x"], "answerIndex": 0},
  {"id": "mixed", "stem": "s", "choices": ["x", 2], "answerIndex": 0},
  {"id": "float", "stem": "s", "choices": ["x", "y"], "answerIndex": 0.5},
  {"id": "negative", "stem": "s", "choices": ["x", "y"], "answerIndex": -1},
  {"id": "no-stem", "choices": ["x", "y"], "answerIndex": 0},
  "not an object",
  null
]"#;
        let parsed = parse_bank_str(json, "core").unwrap();
        assert_eq!(parsed.questions.len(), 1);
        assert_eq!(parsed.questions[0].id, "ok");
        assert_eq!(parsed.rejected, 9);
    }

    #[test]
    fn out_of_range_answer_index_is_kept_and_flagged() {
        let json = r#"[
  {"id": "past-end", "stem": "s", "choices": ["x", "y"], "answerIndex": 9},
  {"id": "negative", "stem": "s", "choices": ["x", "y"], "answerIndex": -3}
]"#;
        let parsed = parse_bank_str(json, "core").unwrap();
        assert_eq!(parsed.rejected, 1);
        assert_eq!(parsed.questions.len(), 1);

        let q = &parsed.questions[0];
        assert_eq!(q.id, "past-end");
        assert_eq!(q.answer_index, 9);
        assert!(q.correct_choice().is_none());
        assert!(!q.is_correct(0) && !q.is_correct(1));

        let warnings = validate_questions(&parsed.questions, None);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].question_id.as_deref(), Some("past-end"));
        assert!(warnings[0].message.contains("answerIndex 9 is out of range for 2 choices"));
    }

    #[test]
    fn wrongly_typed_optional_fields_are_ignored() {
        let json = r#"[
  {"id": "q", "stem": "s", "choices": ["x", "y"], "answerIndex": 0,
   "taskId": 12, "explanation": ["no"], "references": "none"}
]"#;
        let parsed = parse_bank_str(json, "core").unwrap();
        let q = &parsed.questions[0];
        assert!(q.task_id.is_none());
        assert!(q.explanation.is_none());
        assert!(q.references.is_empty());
    }

    #[test]
    fn non_array_bank_is_a_schema_error() {
        let err = parse_bank_str(r#"{"questions": []}"#, "core").unwrap_err();
        assert!(matches!(err, SourceError::Schema(_)));
    }

    #[test]
    fn parse_malformed_json() {
        let err = parse_bank_str("[{ this is not json", "core").unwrap_err();
        assert!(matches!(err, SourceError::InvalidJson(_)));
    }

    #[test]
    fn parse_blueprint() {
        let json = r#"{
  "name": "Plumber IP 2023",
  "totalQuestions": 125,
  "tasks": [
    {"taskId": "A-1", "title": "Uses tools", "count125": 5},
    {"taskId": "A-2", "title": "Organizes work", "count125": 0},
    {"taskId": "B-3", "count125": 120}
  ]
}"#;
        let bp = parse_blueprint_str(json).unwrap();
        assert_eq!(bp.name, "Plumber IP 2023");
        assert_eq!(bp.tasks.len(), 3);
        assert_eq!(bp.tasks[2].title, "");
        assert!(bp.is_consistent());
    }

    #[test]
    fn blueprint_schema_errors() {
        for bad in [
            r#"[]"#,
            r#"{"name": "x", "totalQuestions": 125}"#,
            r#"{"name": "x", "tasks": []}"#,
            r#"{"name": "x", "totalQuestions": "125", "tasks": []}"#,
            r#"{"name": "x", "totalQuestions": 125, "tasks": [{"title": "no id"}]}"#,
        ] {
            let err = parse_blueprint_str(bad).unwrap_err();
            assert!(matches!(err, SourceError::Schema(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn validate_flags_data_problems() {
        let mut questions = vec![
            fixtures::question("q1", "core", Some("A")),
            fixtures::question("q1", "core", Some("A")),
            fixtures::question("q2", "core", Some("Z")),
        ];
        questions[2].answer_index = 9;

        let mut bp = fixtures::blueprint(&[("A", 60), ("B", 60)]);
        bp.tasks.push(bp.tasks[0].clone());

        let warnings = validate_questions(&questions, Some(&bp));
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();

        assert!(messages.iter().any(|m| m.contains("duplicate question ID: q1")));
        assert!(messages.iter().any(|m| m.contains("out of range")));
        assert!(messages.iter().any(|m| m.contains("taskId Z")));
        assert!(messages.iter().any(|m| m.contains("duplicate blueprint task: A")));
        assert!(messages.iter().any(|m| m.contains("sum to 180, expected 125")));
    }

    #[test]
    fn parse_bank_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions-core.json");
        std::fs::write(&path, VALID_BANK).unwrap();

        let parsed = parse_bank_file(&path, "core").unwrap();
        assert_eq!(parsed.questions.len(), 2);
        assert!(parse_bank_file(&dir.path().join("missing.json"), "core").is_err());
    }
}
