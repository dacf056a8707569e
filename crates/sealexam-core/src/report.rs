//! Session report types with JSON persistence and a markdown review.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Mode, Question};
use crate::sampler::{Shortfall, Strategy};
use crate::statistics::Breakdown;

/// A finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique session identifier.
    pub id: Uuid,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Length the user asked for.
    pub requested: usize,
    /// Questions actually presented.
    pub total: usize,
    pub correct: usize,
    /// Rounded percentage score.
    pub percent: u32,
    pub strategy: Strategy,
    /// Blueprint tasks that were under-supplied when the exam was drawn.
    #[serde(default)]
    pub shortfalls: Vec<Shortfall>,
    pub items: Vec<ItemResult>,
    pub missed: Vec<MissedQuestion>,
    pub breakdown: Breakdown,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome for one presented question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    pub question_id: String,
    pub bank: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub chosen: Option<usize>,
    pub correct: bool,
}

/// A question answered incorrectly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissedQuestion {
    pub question: Question,
    pub chosen: Option<usize>,
}

impl MissedQuestion {
    /// Text of the choice the user picked.
    pub fn chosen_text(&self) -> Option<&str> {
        self.chosen
            .and_then(|i| self.question.choices.get(i))
            .map(String::as_str)
    }
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// The score line shown at the end of a session.
    pub fn summary_line(&self) -> String {
        format!(
            "You scored {}/{} ({}%).",
            self.correct, self.total, self.percent
        )
    }

    /// Whether fewer questions were presented than requested.
    pub fn is_short(&self) -> bool {
        self.total < self.requested
    }

    /// Format the results and missed-question review as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("**{}**\n\n", self.summary_line()));
        md.push_str(&format!(
            "Mode: {} | Selection: {} | {}\n\n",
            self.mode,
            self.strategy,
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if self.is_short() {
            md.push_str(&format!(
                "_Requested {} questions, {} were available._\n\n",
                self.requested, self.total
            ));
        }

        if !self.breakdown.per_task.is_empty() {
            md.push_str("### By task\n\n");
            md.push_str("| Task | Correct | Total |\n");
            md.push_str("|------|---------|-------|\n");
            for g in &self.breakdown.per_task {
                md.push_str(&format!("| {} | {} | {} |\n", g.key, g.correct, g.total));
            }
            md.push('\n');
        }

        if self.missed.is_empty() {
            md.push_str("No missed questions. Run another shuffle.\n");
            return md;
        }

        md.push_str(&format!("### Missed ({})\n\n", self.missed.len()));
        for (n, m) in self.missed.iter().enumerate() {
            let q = &m.question;
            md.push_str(&format!("{}. **{}**", n + 1, q.stem));
            if let Some(task) = &q.task_id {
                md.push_str(&format!(" _(Task: {task})_"));
            }
            md.push('\n');
            md.push_str(&format!(
                "   - Your answer: {}\n",
                m.chosen_text().unwrap_or("-")
            ));
            md.push_str(&format!(
                "   - Correct answer: {}\n",
                q.correct_choice().unwrap_or("-")
            ));
            md.push_str(&format!(
                "   - {}\n",
                q.explanation
                    .as_deref()
                    .unwrap_or("Explanation not provided.")
            ));
            for r in &q.references {
                md.push_str(&format!(
                    "   - {} — {} ({}){}\n",
                    r.code,
                    r.location,
                    r.confidence,
                    if r.note.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", r.note)
                    }
                ));
            }
        }

        md
    }
}
