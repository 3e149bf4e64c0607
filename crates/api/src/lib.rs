pub mod assemble;
pub mod error;
pub mod extract;
pub mod registry;
pub mod util;

use assemble::{assemble, Upload};
use error::{Error, Result};
use extract::{Extract, Extractor};
use generator::{Complete, Generator};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::{
    body::{Body, Bytes},
    header::{HeaderValue, CONTENT_TYPE, SET_COOKIE},
    Method, Request, Response, StatusCode,
};
use registry::{Registry, Visit};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use session::{render, Policy, QuestionKind, QuizState, View};
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Upper bound on a request body, base64 uploads included.
const MAX_BODY: usize = 25 << 20;

#[derive(Deserialize)]
struct GenerateBody {
    #[serde(default)]
    files: Vec<Upload>,
    #[serde(default)]
    text: String,
    #[serde(default = "default_count")]
    num_questions: u32,
    #[serde(default = "default_types")]
    question_types: Vec<Box<str>>,
}

fn default_count() -> u32 {
    5
}

fn default_types() -> Vec<Box<str>> {
    vec![QuestionKind::MultipleChoice.label().into()]
}

#[derive(Deserialize)]
struct AnswerBody {
    answer: Box<str>,
}

#[derive(Serialize)]
struct Generated<'a> {
    view: View<'a>,
    /// Token for `GET /quiz?data=...`.
    share: &'a str,
    warnings: &'a [String],
}

#[derive(Serialize)]
struct Failure<'a> {
    error: String,
    warnings: &'a [String],
}

fn json(status: StatusCode, body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut res = Response::new(Full::new(Bytes::from(body)));
    *res.status_mut() = status;
    assert!(res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json")).is_none());
    res
}

async fn read_json<T, B>(body: B) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<BoxError>,
{
    let bytes = Limited::new(body, MAX_BODY)
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                Error::PayloadTooLarge
            } else {
                Error::BadRequest("Could not read the request body.")
            }
        })?
        .to_bytes();
    serde_json::from_slice(&bytes).map_err(|_| Error::BadRequest("Malformed request body."))
}

pub struct App<C> {
    /// Absent when no API key was configured.
    generator: Option<Generator<C>>,
    extractor: Arc<dyn Extract + Send + Sync>,
    sessions: Registry,
}

impl<C: Complete + Sync> App<C> {
    pub fn new(generator: Option<Generator<C>>, policy: Policy) -> Self {
        Self { generator, extractor: Arc::new(Extractor), sessions: Registry::new(policy) }
    }

    pub async fn respond<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let mut visit = self.sessions.visit(util::session::extract_session(req.headers()));

        let mut warnings = Vec::new();
        let mut res = match self.try_respond(&mut visit, req, &mut warnings).await {
            Ok(body) => json(StatusCode::OK, body),
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    log::error!("Request failed with {status}: {err}");
                } else {
                    log::warn!("Request rejected with {status}: {err}");
                }
                let body = serde_json::to_vec(&Failure { error: err.to_string(), warnings: &warnings });
                json(status, body.unwrap_or_default())
            }
        };

        if let Some(sid) = visit.opened() {
            if let Ok(cookie) = HeaderValue::from_str(&util::session::session_cookie(sid)) {
                assert!(res.headers_mut().insert(SET_COOKIE, cookie).is_none());
            }
        }

        res
    }

    /// Forgets idle sessions. Meant to be called periodically.
    pub fn sweep(&self) -> usize {
        self.sessions.sweep()
    }

    async fn try_respond<B>(
        &self,
        visit: &mut Visit<'_>,
        req: Request<B>,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<u8>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let segments: Vec<_> = parts.uri.path().split('/').filter(|segment| !segment.is_empty()).collect();
        match (&parts.method, segments.as_slice()) {
            (&Method::GET, ["quiz"]) => self.show(visit, parts.uri.query()),
            (&Method::DELETE, ["quiz"]) => self.update(visit, |quiz| {
                quiz.clear_quiz();
                Ok(())
            }),
            (&Method::POST, ["quiz", "reset"]) => self.update(visit, |quiz| {
                quiz.reset_all_answers();
                Ok(())
            }),
            (&Method::POST, ["generate"]) => {
                let body = read_json(body).await?;
                self.generate(visit, body, warnings).await
            }
            (&Method::POST, ["quiz", index, action]) => {
                let index: usize = index.parse().map_err(|_| Error::NotFound)?;
                match *action {
                    "answer" => {
                        let AnswerBody { answer } = read_json(body).await?;
                        self.update(visit, |quiz| quiz.select_answer(index, &answer))
                    }
                    "check" => self.update(visit, |quiz| quiz.check_answer(index).map(drop)),
                    "retry" => self.update(visit, |quiz| quiz.retry(index)),
                    _ => Err(Error::NotFound),
                }
            }
            _ => Err(Error::NotFound),
        }
    }

    /// Applies `op` to the session's quiz and renders the result. Without a session, `op` runs against an
    /// empty quiz that is thrown away afterwards.
    fn update<F>(&self, visit: &Visit<'_>, op: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&mut QuizState) -> session::error::Result<()>,
    {
        let apply = |quiz: &mut QuizState| -> Result<Vec<u8>> {
            op(quiz)?;
            serde_json::to_vec(&render(quiz)).map_err(|_| Error::Fatal)
        };
        match visit.session() {
            Some(sid) => self.sessions.with(sid, apply)?,
            None => apply(&mut QuizState::new(self.sessions.policy())),
        }
    }

    /// Renders the current quiz, first replacing it with a shared one if the query carries a token.
    fn show(&self, visit: &mut Visit<'_>, query: Option<&str>) -> Result<Vec<u8>> {
        let mut pairs = query.into_iter().flat_map(|query| query.split('&'));
        let token = pairs.find_map(|pair| pair.strip_prefix("data="));
        let Some(token) = token else {
            return self.update(visit, |_| Ok(()));
        };

        match session::share::decode(token) {
            Ok(questions) => {
                let sid = visit.open()?;
                log::info!("Session {sid} loaded a shared quiz of {} questions", questions.len());
                self.update(visit, |quiz| {
                    quiz.set_questions(questions);
                    Ok(())
                })
            }
            Err(err) => {
                if let Some(sid) = visit.session() {
                    self.sessions.with(sid, QuizState::clear_quiz)?;
                }
                Err(err.into())
            }
        }
    }

    async fn generate(&self, visit: &mut Visit<'_>, body: GenerateBody, warnings: &mut Vec<String>) -> Result<Vec<u8>> {
        let generator = self.generator.as_ref().ok_or(Error::MissingApiKey)?;
        let sid = visit.open()?;
        let _generating = self.sessions.begin_generation(sid)?;

        // Extraction may shell out to an external converter.
        let GenerateBody { files, text, num_questions, question_types } = body;
        let extractor = Arc::clone(&self.extractor);
        let assembled = tokio::task::spawn_blocking(move || assemble(&*extractor, &files, &text))
            .await
            .map_err(|_| Error::Fatal)?;
        warnings.extend(assembled.failures.iter().map(ToString::to_string));

        let request = generator::Request::from_labels(&assembled.content, num_questions, question_types.as_slice())?;
        let questions = generator.generate(&request).await?;
        let share = session::share::encode(&questions).map_err(|_| Error::Fatal)?;
        log::info!("Session {sid} received {} questions", questions.len());

        self.sessions.with(sid, |quiz| {
            quiz.set_questions(questions);
            let generated = Generated { view: render(quiz), share: &share, warnings: warnings.as_slice() };
            serde_json::to_vec(&generated).map_err(|_| Error::Fatal)
        })?
    }
}
