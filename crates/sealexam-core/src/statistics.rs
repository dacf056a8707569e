//! Score arithmetic and per-bank / per-task breakdowns.

use serde::{Deserialize, Serialize};

use crate::model::{Blueprint, Question};
use crate::sampler::apportion;
use crate::session::AnswerState;

/// Label used for questions without a blueprint task.
pub const UNTAGGED: &str = "untagged";

/// Percentage of `correct` out of `total`, rounded half up. Zero when
/// `total` is zero.
pub fn percent(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * correct + total) / (2 * total)) as u32
}

/// Results for one group of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
}

impl GroupStats {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            total: 0,
            answered: 0,
            correct: 0,
        }
    }

    /// Fraction of questions in the group answered correctly.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Results grouped by bank and by blueprint task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub per_bank: Vec<GroupStats>,
    pub per_task: Vec<GroupStats>,
}

/// Group answers by bank and task, in order of first appearance.
pub fn compute_breakdown(questions: &[Question], answers: &[AnswerState]) -> Breakdown {
    let mut breakdown = Breakdown::default();

    for (q, a) in questions.iter().zip(answers) {
        let task = q.task_id.as_deref().unwrap_or(UNTAGGED);
        for (groups, key) in [
            (&mut breakdown.per_bank, q.bank.as_str()),
            (&mut breakdown.per_task, task),
        ] {
            let idx = match groups.iter().position(|g| g.key == key) {
                Some(idx) => idx,
                None => {
                    groups.push(GroupStats::new(key));
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];
            group.total += 1;
            if a.is_answered() {
                group.answered += 1;
            }
            if a.correct == Some(true) {
                group.correct += 1;
            }
        }
    }

    breakdown
}

/// How well the pool covers one blueprint task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCoverage {
    pub task_id: String,
    pub title: String,
    pub count125: usize,
    /// Target for the session length the coverage was computed for.
    pub target: usize,
    /// Tagged questions available in the pool.
    pub available: usize,
}

impl TaskCoverage {
    pub fn is_short(&self) -> bool {
        self.available < self.target
    }
}

/// Compare available questions per task with the targets for `length`.
/// Lists every blueprint task, including zero-count ones.
pub fn task_coverage(pool: &[Question], blueprint: &Blueprint, length: usize) -> Vec<TaskCoverage> {
    let targets = apportion(blueprint, length);
    blueprint
        .tasks
        .iter()
        .map(|task| TaskCoverage {
            task_id: task.task_id.clone(),
            title: task.title.clone(),
            count125: task.count125,
            target: targets
                .iter()
                .find(|t| t.task_id == task.task_id)
                .map_or(0, |t| t.target),
            available: pool.iter().filter(|q| q.belongs_to(&task.task_id)).count(),
        })
        .collect()
}
