use core::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No question exists at the given index.
    UnknownQuestion,
    /// The selection is not one of the question's options.
    NotAnOption,
    /// The question was already checked. It must be retried before it can be answered again.
    Locked,
    /// Checking requires a selection under the active policy.
    NoSelection,
    /// Only incorrectly answered questions may be retried.
    NotRetryable,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownQuestion => "Question not found.",
            Self::NotAnOption => "That answer is not one of the options.",
            Self::Locked => "This question has already been checked. Try again to change your answer.",
            Self::NoSelection => "Please select an answer first.",
            Self::NotRetryable => "Only incorrect answers can be retried.",
        })
    }
}

pub type Result<T> = core::result::Result<T, Error>;
