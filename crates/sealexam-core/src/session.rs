//! Administering a quiz one question at a time.
//!
//! A [`Session`] owns its question set and the answer state for each
//! question. Answers lock once chosen; moving forward requires an answer;
//! moving past the last question finishes the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{Mode, Question};
use crate::report::{ItemResult, MissedQuestion, SessionReport};
use crate::sampler::{Selection, Shortfall, Strategy};
use crate::statistics::{compute_breakdown, percent};

/// The user's answer to one question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerState {
    pub chosen: Option<usize>,
    pub correct: Option<bool>,
}

impl AnswerState {
    pub fn is_answered(&self) -> bool {
        self.chosen.is_some()
    }
}

/// Result of trying to move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now showing the question at this index.
    Moved(usize),
    /// The last question was answered; the session is over.
    Finished,
}

/// One run through a selected question set.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    mode: Mode,
    requested: usize,
    strategy: Strategy,
    shortfalls: Vec<Shortfall>,
    questions: Vec<Question>,
    answers: Vec<AnswerState>,
    index: usize,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Start a session over a selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when the selection has no questions.
    pub fn start(selection: Selection, mode: Mode) -> Result<Self, SessionError> {
        if selection.questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let answers = vec![AnswerState::default(); selection.questions.len()];
        Ok(Self {
            id: Uuid::new_v4(),
            mode,
            requested: selection.requested,
            strategy: selection.strategy,
            shortfalls: selection.shortfalls,
            questions: selection.questions,
            answers,
            index: 0,
            started_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Zero-based index of the current question.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.questions.len()
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.index]
    }

    pub fn current_answer(&self) -> &AnswerState {
        &self.answers[self.index]
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[AnswerState] {
        &self.answers
    }

    /// Answer the current question. Returns whether the answer was correct.
    ///
    /// # Errors
    ///
    /// Fails if the question is already answered or `choice` is not one of
    /// its choices.
    pub fn answer(&mut self, choice: usize) -> Result<bool, SessionError> {
        let question = &self.questions[self.index];
        let state = &mut self.answers[self.index];
        if state.is_answered() {
            return Err(SessionError::AlreadyAnswered(question.id.clone()));
        }
        if choice >= question.choices.len() {
            return Err(SessionError::ChoiceOutOfRange {
                choice,
                available: question.choices.len(),
            });
        }
        let correct = question.is_correct(choice);
        state.chosen = Some(choice);
        state.correct = Some(correct);
        Ok(correct)
    }

    /// Move to the next question, or finish after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unanswered` if the current question has no answer.
    pub fn next(&mut self) -> Result<Advance, SessionError> {
        if !self.current_answer().is_answered() {
            return Err(SessionError::Unanswered);
        }
        if self.is_last() {
            return Ok(Advance::Finished);
        }
        self.index += 1;
        Ok(Advance::Moved(self.index))
    }

    /// Move back one question. Returns `false` on the first question.
    pub fn prev(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Number of correct answers so far.
    pub fn score(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.correct == Some(true))
            .count()
    }

    pub fn answered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// Questions answered incorrectly, with the answer given.
    pub fn missed(&self) -> impl Iterator<Item = (&Question, &AnswerState)> {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(_, a)| a.correct == Some(false))
    }

    /// End the session and produce its report. Unanswered questions count
    /// as not correct but are not listed as missed.
    pub fn finish(self) -> SessionReport {
        let finished_at = Utc::now();
        let total = self.questions.len();
        let correct = self.score();
        let breakdown = compute_breakdown(&self.questions, &self.answers);

        let missed = self
            .missed()
            .map(|(q, a)| MissedQuestion {
                question: q.clone(),
                chosen: a.chosen,
            })
            .collect();

        let items = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(q, a)| ItemResult {
                question_id: q.id.clone(),
                bank: q.bank.clone(),
                task_id: q.task_id.clone(),
                chosen: a.chosen,
                correct: a.correct == Some(true),
            })
            .collect();

        let duration_ms = (finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;

        SessionReport {
            id: self.id,
            mode: self.mode,
            started_at: self.started_at,
            finished_at,
            requested: self.requested,
            total,
            correct,
            percent: percent(correct, total),
            strategy: self.strategy,
            shortfalls: self.shortfalls,
            items,
            missed,
            breakdown,
            duration_ms,
        }
    }
}
