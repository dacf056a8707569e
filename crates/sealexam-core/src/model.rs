//! Core data model types for sealexam.
//!
//! These are the fundamental types the rest of the system uses to represent
//! questions, their clause references, and the certification blueprint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of questions on the reference exam that blueprint counts are
/// expressed against.
pub const REFERENCE_EXAM_LENGTH: usize = 125;

/// The exam lengths offered by default.
pub const STANDARD_LENGTHS: [usize; 3] = [15, 40, REFERENCE_EXAM_LENGTH];

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier within the loaded pool.
    pub id: String,
    /// The question text.
    pub stem: String,
    /// Answer choices, in presentation order.
    pub choices: Vec<String>,
    /// Index into `choices` of the correct answer.
    pub answer_index: usize,
    /// Bank tag used for pool filtering.
    pub bank: String,
    /// Display category, when the record carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Blueprint task this question counts towards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Shown after the question is answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Code clause references backing the answer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

impl Question {
    /// Returns `true` if `choice` is the correct answer.
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer_index
    }

    /// The correct choice text, if the answer index is in range.
    pub fn correct_choice(&self) -> Option<&str> {
        self.choices.get(self.answer_index).map(String::as_str)
    }

    /// Whether this question is tagged with the given blueprint task.
    pub fn belongs_to(&self, task_id: &str) -> bool {
        self.task_id.as_deref() == Some(task_id)
    }
}

/// A reference to a code clause supporting a question's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Code or standard name (e.g. "NPC 2020").
    pub code: String,
    /// Location within the code (e.g. "2.4.10.1").
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub confidence: Confidence,
}

/// How well a reference has been checked against the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Verified,
    #[default]
    NeedsVerify,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Verified => write!(f, "verified"),
            Confidence::NeedsVerify => write!(f, "needs_verify"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verified" => Ok(Confidence::Verified),
            "needs_verify" | "needs-verify" => Ok(Confidence::NeedsVerify),
            other => Err(format!("unknown confidence: {other}")),
        }
    }
}

/// A published weighting of exam content by task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    #[serde(default)]
    pub name: String,
    /// Length of the reference exam the task counts add up to.
    pub total_questions: usize,
    pub tasks: Vec<BlueprintTask>,
}

impl Blueprint {
    /// Sum of `count125` over all tasks, saturating at `usize::MAX`.
    pub fn count_sum(&self) -> usize {
        self.tasks
            .iter()
            .fold(0usize, |sum, t| sum.saturating_add(t.count125))
    }

    /// Whether the task counts add up to `total_questions`.
    pub fn is_consistent(&self) -> bool {
        self.count_sum() == self.total_questions
    }

    /// Tasks that contribute to weighting.
    pub fn weighted_tasks(&self) -> impl Iterator<Item = &BlueprintTask> {
        self.tasks.iter().filter(|t| t.count125 > 0)
    }

    pub fn task(&self, task_id: &str) -> Option<&BlueprintTask> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }
}

/// One task of a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintTask {
    pub task_id: String,
    #[serde(default)]
    pub title: String,
    /// Questions this task receives on a 125-question reference exam.
    #[serde(default)]
    pub count125: usize,
}

/// How a session presents feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Exam,
    Training,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Exam => write!(f, "exam"),
            Mode::Training => write!(f, "training"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exam" => Ok(Mode::Exam),
            "training" | "train" => Ok(Mode::Training),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}
