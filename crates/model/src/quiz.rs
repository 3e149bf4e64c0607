use alloc::{boxed::Box, vec::Vec};
use serde::{Deserialize, Serialize};

/// The two answer formats the generator knows how to ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

impl QuestionKind {
    /// Canonical options for true/false questions.
    pub const BOOLEAN_OPTIONS: [&'static str; 2] = ["True", "False"];

    /// Resolves either a user-facing label (e.g. `Multiple Choice`) or a canonical tag (e.g. `true_false`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Multiple Choice" | "multiple_choice" => Some(Self::MultipleChoice),
            "True/False" | "true_false" => Some(Self::TrueFalse),
            _ => None,
        }
    }

    /// The literal tag the model must emit in the `type` field.
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MultipleChoice => "Multiple Choice",
            Self::TrueFalse => "True/False",
        }
    }
}

/// A fully validated quiz item. The correct answer is always one of the options.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionRecord {
    /// Prompt text shown to the user.
    pub question: Box<str>,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Options in display order.
    pub options: Vec<Box<str>>,
    pub correct_answer: Box<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Box<str>>,
}

impl QuestionRecord {
    /// Whether `answer` is exactly the correct option.
    pub fn is_correct(&self, answer: &str) -> bool {
        *self.correct_answer == *answer
    }

    pub fn has_option(&self, answer: &str) -> bool {
        self.options.iter().any(|option| **option == *answer)
    }

    /// Builds a true/false record with the canonical option pair.
    pub fn true_false(question: &str, answer: bool, explanation: Option<&str>) -> Self {
        let [yes, no] = QuestionKind::BOOLEAN_OPTIONS;
        Self {
            question: question.into(),
            kind: QuestionKind::TrueFalse,
            options: alloc::vec![yes.into(), no.into()],
            correct_answer: if answer { yes } else { no }.into(),
            explanation: explanation.map(Into::into),
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_labels_and_tags() {
        assert_eq!(QuestionKind::from_label("Multiple Choice"), Some(QuestionKind::MultipleChoice));
        assert_eq!(QuestionKind::from_label("True/False"), Some(QuestionKind::TrueFalse));
        assert_eq!(QuestionKind::from_label(" true_false "), Some(QuestionKind::TrueFalse));
        assert_eq!(QuestionKind::from_label("Essay"), None);
    }

    #[test]
    fn serializes_kind_under_type_field() {
        let record = QuestionRecord::true_false("Is water wet?", true, None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "true_false");
        assert_eq!(json["options"], serde_json::json!(["True", "False"]));
        assert_eq!(json["correct_answer"], "True");
        assert!(json.get("explanation").is_none());
    }
}
