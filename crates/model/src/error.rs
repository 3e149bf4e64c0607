use core::fmt::{self, Display};

/// Why a raw question failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The payload is not a list of questions.
    NotAList,
    /// The batch did not contain a single question.
    Empty,
    /// The question is not an object, or a field has the wrong JSON type.
    Malformed,
    /// A required field is absent (or blank).
    MissingField(&'static str),
    /// The `type` field is neither `multiple_choice` nor `true_false`.
    UnknownKind,
    /// A multiple-choice question offers fewer than two options.
    TooFewOptions,
    /// The correct answer is not among the options.
    AnswerNotAnOption,
    /// A true/false question has an answer other than true or false.
    NotBoolean,
}

impl Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAList => f.write_str("expected a list of questions"),
            Self::Empty => f.write_str("no questions were given"),
            Self::Malformed => f.write_str("not a well-formed question object"),
            Self::MissingField(field) => write!(f, "missing `{field}`"),
            Self::UnknownKind => f.write_str("unknown question type"),
            Self::TooFewOptions => f.write_str("a multiple choice question needs at least two options"),
            Self::AnswerNotAnOption => f.write_str("the correct answer is not one of the options"),
            Self::NotBoolean => f.write_str("a true/false answer must be either True or False"),
        }
    }
}

/// The first invalid question of a batch, by its zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid {
    pub index: usize,
    pub reason: Reason,
}

impl Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Reason::NotAList | Reason::Empty = self.reason {
            return Display::fmt(&self.reason, f);
        }
        write!(f, "question {}: {}", self.index + 1, self.reason)
    }
}

/// Failure to turn JSON text into a question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The text is not JSON at all.
    Syntax,
    /// The JSON does not describe a valid question set.
    Invalid(Invalid),
}

impl From<Invalid> for DecodeError {
    fn from(err: Invalid) -> Self {
        Self::Invalid(err)
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => f.write_str("not valid JSON"),
            Self::Invalid(err) => Display::fmt(err, f),
        }
    }
}

pub type Result<T> = core::result::Result<T, Invalid>;
