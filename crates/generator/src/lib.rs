pub mod error;
pub mod gemini;
mod prompt;
mod reply;

pub use gemini::Gemini;

use core::future::Future;
use error::{Error, Result, ServiceError};
use model::{QuestionKind, QuestionRecord};
use std::collections::BTreeSet;

/// Inclusive bounds on how many questions may be requested at once.
pub const QUESTION_RANGE: core::ops::RangeInclusive<u32> = 1..=15;

/// A black-box text completion service.
pub trait Complete {
    fn complete(&self, prompt: &str) -> impl Future<Output = core::result::Result<String, ServiceError>> + Send;
}

/// Everything needed to ask for a quiz.
pub struct Request<'a> {
    pub content: &'a str,
    pub count: u32,
    pub kinds: BTreeSet<QuestionKind>,
}

impl<'a> Request<'a> {
    /// Builds a request from user-facing type labels such as `Multiple Choice` and `True/False`.
    pub fn from_labels<L>(content: &'a str, count: u32, labels: &[L]) -> Result<Self>
    where
        L: AsRef<str>,
    {
        let kinds = labels
            .iter()
            .map(|label| QuestionKind::from_label(label.as_ref()))
            .collect::<Option<_>>()
            .ok_or(Error::InvalidRequest("Unknown question type."))?;
        Ok(Self { content, count, kinds })
    }

    fn check(&self) -> Result<()> {
        if self.kinds.is_empty() {
            return Err(Error::InvalidRequest("Please select at least one question type."));
        }
        if self.content.trim().is_empty() {
            return Err(Error::InvalidRequest("Please upload files or enter text to generate questions."));
        }
        if !QUESTION_RANGE.contains(&self.count) {
            return Err(Error::InvalidRequest("The number of questions must be between 1 and 15."));
        }
        Ok(())
    }
}

pub struct Generator<C> {
    client: C,
}

impl<C: Complete> Generator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Asks the model for a quiz. On any failure no questions are returned at all.
    pub async fn generate(&self, request: &Request<'_>) -> Result<Vec<QuestionRecord>> {
        request.check()?;

        let kinds: Vec<_> = request.kinds.iter().copied().collect();
        let prompt = prompt::build(&kinds, request.content.trim(), request.count);
        let reply = self.client.complete(&prompt).await.map_err(|err| {
            log::error!("Generation call failed: {err}");
            Error::from(err)
        })?;
        log::debug!("Model replied with {} bytes: {reply}", reply.len());

        let questions = reply::parse(&reply).inspect_err(|err| log::warn!("Discarding model reply: {err:?}"))?;

        if questions.len() != request.count as usize {
            log::warn!("Asked for {} questions but received {}", request.count, questions.len());
        }
        if let Some(extra) = questions.iter().find(|question| !request.kinds.contains(&question.kind)) {
            log::warn!("Received a {} question that was not requested", extra.kind.as_tag());
        }

        log::info!("Generated {} questions", questions.len());
        Ok(questions)
    }
}
