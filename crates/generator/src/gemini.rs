//! Client for Google's `generateContent` REST endpoint.

use crate::{error::ServiceError, Complete};
use core::time::Duration;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling parameters passed through to the service untouched.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self { temperature: 0.7, top_p: 0.95, top_k: 40, max_output_tokens: 8192 }
    }
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

static SAFETY_SETTINGS: [SafetySetting; 4] = [
    SafetySetting { category: "HARM_CATEGORY_HARASSMENT", threshold: "BLOCK_ONLY_HIGH" },
    SafetySetting { category: "HARM_CATEGORY_HATE_SPEECH", threshold: "BLOCK_ONLY_HIGH" },
    SafetySetting { category: "HARM_CATEGORY_SEXUALLY_EXPLICIT", threshold: "BLOCK_ONLY_HIGH" },
    SafetySetting { category: "HARM_CATEGORY_DANGEROUS_CONTENT", threshold: "BLOCK_ONLY_HIGH" },
];

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct UserContent<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [UserContent<'a>; 1],
    generation_config: Sampling,
    safety_settings: &'a [SafetySetting],
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<Box<str>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<Box<str>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateReply {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Result<String, ServiceError> {
        if let Some(reason) = self.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(ServiceError::Blocked(reason));
        }

        let Candidate { content, finish_reason } = self.candidates.into_iter().next().ok_or(ServiceError::Empty)?;
        let text: String =
            content.into_iter().flat_map(|content| content.parts).filter_map(|part| part.text).collect();
        if !text.trim().is_empty() {
            return Ok(text);
        }

        match finish_reason {
            Some(reason) if &*reason == "SAFETY" => Err(ServiceError::Blocked(reason)),
            _ => Err(ServiceError::Empty),
        }
    }
}

pub struct Gemini {
    http: reqwest::Client,
    endpoint: Box<str>,
    key: Box<str>,
    sampling: Sampling,
}

impl Gemini {
    pub fn new(key: &str, model: &str) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        let endpoint = format!("{BASE_URL}/{model}:generateContent").into_boxed_str();
        Ok(Self { http, endpoint, key: key.into(), sampling: Sampling::default() })
    }
}

impl Complete for Gemini {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = GenerateRequest {
            contents: [UserContent { parts: [TextPart { text: prompt }] }],
            generation_config: self.sampling,
            safety_settings: &SAFETY_SETTINGS,
        };

        let req = self.http.post(&*self.endpoint).header("x-goog-api-key", &*self.key).json(&body);
        let res = req.send().await?;
        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            log::error!("Gemini responded with {status}: {detail}");
            return Err(ServiceError::Status(status.as_u16()));
        }

        let reply: GenerateReply = res.json().await?;
        reply.into_text()
    }
}
