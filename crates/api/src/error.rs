use core::fmt::{self, Display};
use hyper::StatusCode;

#[derive(Debug)]
pub enum Error {
    /// The request body or path could not be understood.
    BadRequest(&'static str),
    NotFound,
    PayloadTooLarge,
    /// No API key was configured at startup.
    MissingApiKey,
    /// The session already has a generation call in flight.
    Busy,
    /// Too many live sessions to open another one.
    Saturated,
    Generation(generator::error::Error),
    Quiz(session::error::Error),
    Share(session::share::Error),
    Fatal,
}

impl From<generator::error::Error> for Error {
    fn from(err: generator::error::Error) -> Self {
        Self::Generation(err)
    }
}

impl From<session::error::Error> for Error {
    fn from(err: session::error::Error) -> Self {
        Self::Quiz(err)
    }
}

impl From<session::share::Error> for Error {
    fn from(err: session::share::Error) -> Self {
        Self::Share(err)
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        use generator::error::Error as Gen;
        use session::error::Error as Quiz;
        match self {
            Self::BadRequest(_) | Self::Share(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingApiKey | Self::Saturated => StatusCode::SERVICE_UNAVAILABLE,
            Self::Busy => StatusCode::CONFLICT,
            Self::Generation(Gen::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Generation(Gen::ExternalService(_)) => StatusCode::BAD_GATEWAY,
            Self::Generation(Gen::MalformedResponse | Gen::ValidationFailed(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Quiz(Quiz::UnknownQuestion) => StatusCode::NOT_FOUND,
            Self::Quiz(Quiz::NotAnOption | Quiz::NoSelection) => StatusCode::BAD_REQUEST,
            Self::Quiz(Quiz::Locked | Quiz::NotRetryable) => StatusCode::CONFLICT,
            Self::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(reason) => f.write_str(reason),
            Self::NotFound => f.write_str("Not found."),
            Self::PayloadTooLarge => f.write_str("The uploaded files are too large."),
            Self::MissingApiKey => f.write_str("Please set the GOOGLE_API_KEY in your environment variables."),
            Self::Busy => f.write_str("A quiz is already being generated for this session."),
            Self::Saturated => f.write_str("The server is busy. Please try again later."),
            Self::Generation(err) => err.fmt(f),
            Self::Quiz(err) => err.fmt(f),
            Self::Share(err) => err.fmt(f),
            Self::Fatal => f.write_str("Internal server error."),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
