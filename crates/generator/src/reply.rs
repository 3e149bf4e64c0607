use crate::error::{Error, Result};
use model::{error::DecodeError, QuestionRecord};

/// Removes a surrounding markdown code fence (with an optional `json` tag) from a model reply.
pub fn strip_fence(reply: &str) -> &str {
    let text = reply.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };

    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Turns raw model output into a validated question set.
pub fn parse(reply: &str) -> Result<Vec<QuestionRecord>> {
    model::decode(strip_fence(reply)).map_err(|err| match err {
        DecodeError::Syntax => Error::MalformedResponse,
        DecodeError::Invalid(invalid) => Error::ValidationFailed(invalid),
    })
}
