use core::fmt::{self, Display};
use model::error::Invalid;

/// Failures of the outbound completion call.
#[derive(Debug)]
pub enum ServiceError {
    /// Connection, timeout or body read failure.
    Transport(reqwest::Error),
    /// The service answered with a non-success status.
    Status(u16),
    /// The prompt or the reply was withheld by the service's safety filters.
    Blocked(Box<str>),
    /// The reply carried no text at all.
    Empty,
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) if err.is_timeout() => f.write_str("the request timed out"),
            Self::Transport(err) => write!(f, "transport failure: {err}"),
            Self::Status(code) => write!(f, "unexpected status code {code}"),
            Self::Blocked(reason) => write!(f, "blocked by safety filters ({reason})"),
            Self::Empty => f.write_str("empty reply"),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// Empty content, no question types or a question count out of range. Nothing was sent.
    InvalidRequest(&'static str),
    /// The generation service could not be reached or refused to answer.
    ExternalService(ServiceError),
    /// The reply was not JSON.
    MalformedResponse,
    /// The reply was JSON but not a usable question set.
    ValidationFailed(Invalid),
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Self::ExternalService(err)
    }
}

impl From<Invalid> for Error {
    fn from(err: Invalid) -> Self {
        Self::ValidationFailed(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(reason) => f.write_str(reason),
            Self::ExternalService(err) => write!(f, "Error generating questions: {err}."),
            Self::MalformedResponse => f.write_str("Failed to generate questions. Please try again."),
            Self::ValidationFailed(err) => {
                write!(f, "Generated questions failed validation ({err}). Please try again.")
            }
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
