pub mod error;
pub mod render;
pub mod share;

pub use model::{QuestionKind, QuestionRecord};
pub use render::{render, View};

use error::{Error, Result};
use serde::Serialize;

/// Grading knobs shared by every question of a quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policy {
    /// When set, checking without a selection is refused. Otherwise it counts as a wrong answer.
    pub require_selection: bool,
    /// When set, a retry also forgets the previously selected answer.
    pub retry_clears_selection: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self { require_selection: false, retry_clears_selection: true }
    }
}

/// Where a single question stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Unanswered,
    Answered,
    Correct,
    Incorrect,
}

/// Answer bookkeeping for one question.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnswerState {
    pub selected: Option<Box<str>>,
    pub checked: bool,
    pub correct: bool,
}

impl AnswerState {
    pub fn status(&self) -> Status {
        match (self.checked, self.correct, &self.selected) {
            (true, true, _) => Status::Correct,
            (true, false, _) => Status::Incorrect,
            (false, _, Some(_)) => Status::Answered,
            (false, _, None) => Status::Unanswered,
        }
    }
}

/// Aggregate progress of a quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    /// Fraction of correctly answered questions in `[0, 1]`.
    pub fn progress(self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32
        }
    }

    pub fn percent(self) -> u8 {
        (self.progress() * 100.0).round() as u8
    }
}

/// The quiz of one session: its questions and one [`AnswerState`] per question, index for index.
#[derive(Clone, Debug, Default)]
pub struct QuizState {
    questions: Vec<QuestionRecord>,
    answers: Vec<AnswerState>,
    policy: Policy,
}

impl QuizState {
    pub fn new(policy: Policy) -> Self {
        Self { questions: Vec::new(), answers: Vec::new(), policy }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn answer(&self, index: usize) -> Option<&AnswerState> {
        self.answers.get(index)
    }

    /// Pairs every question with its answer state, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionRecord, &AnswerState)> {
        self.questions.iter().zip(&self.answers)
    }

    /// Replaces the quiz. All previous answers are forgotten.
    pub fn set_questions(&mut self, questions: Vec<QuestionRecord>) {
        self.answers = vec![AnswerState::default(); questions.len()];
        self.questions = questions;
    }

    fn entry(&mut self, index: usize) -> Result<(&QuestionRecord, &mut AnswerState)> {
        let question = self.questions.get(index).ok_or(Error::UnknownQuestion)?;
        let answer = self.answers.get_mut(index).ok_or(Error::UnknownQuestion)?;
        Ok((question, answer))
    }

    pub fn select_answer(&mut self, index: usize, value: &str) -> Result<()> {
        let (question, answer) = self.entry(index)?;
        if answer.checked {
            return Err(Error::Locked);
        }
        if !question.has_option(value) {
            return Err(Error::NotAnOption);
        }
        answer.selected = Some(value.into());
        Ok(())
    }

    /// Grades a question and returns whether it was answered correctly. Checking is one-shot: checking
    /// an already checked question only reports the earlier outcome.
    pub fn check_answer(&mut self, index: usize) -> Result<bool> {
        let require_selection = self.policy.require_selection;
        let (question, answer) = self.entry(index)?;
        if answer.checked {
            return Ok(answer.correct);
        }

        let correct = match answer.selected.as_deref() {
            Some(selected) => question.is_correct(selected),
            None if require_selection => return Err(Error::NoSelection),
            None => false,
        };
        answer.checked = true;
        answer.correct = correct;
        Ok(correct)
    }

    /// Reopens an incorrectly answered question.
    pub fn retry(&mut self, index: usize) -> Result<()> {
        let clear_selection = self.policy.retry_clears_selection;
        let (_, answer) = self.entry(index)?;
        if answer.status() != Status::Incorrect {
            return Err(Error::NotRetryable);
        }

        answer.checked = false;
        answer.correct = false;
        if clear_selection {
            answer.selected = None;
        }
        Ok(())
    }

    pub fn reset_all_answers(&mut self) {
        self.answers.fill(AnswerState::default());
    }

    pub fn clear_quiz(&mut self) {
        self.questions.clear();
        self.answers.clear();
    }

    pub fn score(&self) -> Score {
        let correct = self.answers.iter().filter(|answer| answer.correct).count();
        Score { correct, total: self.questions.len() }
    }
}
