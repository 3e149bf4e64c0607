//! URL-safe tokens for carrying a quiz between views. A token comes from the outside world, so decoding
//! re-validates it exactly like a fresh model reply.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use core::fmt::{self, Display};
use model::{error::DecodeError, QuestionRecord};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Not base64, or not UTF-8 once decoded.
    Encoding,
    Questions(DecodeError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding => f.write_str("Error loading quiz data: the link is corrupted."),
            Self::Questions(err) => write!(f, "Error loading quiz data: {err}."),
        }
    }
}

pub fn encode(questions: &[QuestionRecord]) -> serde_json::Result<String> {
    let json = serde_json::to_vec(questions)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode(token: &str) -> Result<Vec<QuestionRecord>, Error> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| Error::Encoding)?;
    let text = core::str::from_utf8(&bytes).map_err(|_| Error::Encoding)?;
    model::decode(text).map_err(Error::Questions)
}
