use crate::{
    error::{DecodeError, Invalid, Reason, Result},
    QuestionKind, QuestionRecord,
};
use alloc::{boxed::Box, string::String, vec::Vec};
use serde::Deserialize;
use serde_json::Value;

/// Models occasionally answer true/false questions with a JSON boolean instead of a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Flag(bool),
}

/// Lenient schema for a question as delivered by the model. Nothing here is trusted until [`validate`]
/// turns it into a [`QuestionRecord`].
#[derive(Debug, Default, Deserialize)]
pub struct RawQuestion {
    pub question: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<Answer>,
    pub explanation: Option<String>,
}

fn parse_kind(tag: &str) -> Option<QuestionKind> {
    let tag = tag.trim();
    if tag.eq_ignore_ascii_case("multiple_choice") {
        Some(QuestionKind::MultipleChoice)
    } else if tag.eq_ignore_ascii_case("true_false") {
        Some(QuestionKind::TrueFalse)
    } else {
        None
    }
}

fn parse_bool(answer: &Answer) -> Option<bool> {
    match answer {
        Answer::Flag(flag) => Some(*flag),
        Answer::Text(text) if text.trim().eq_ignore_ascii_case("true") => Some(true),
        Answer::Text(text) if text.trim().eq_ignore_ascii_case("false") => Some(false),
        Answer::Text(_) => None,
    }
}

impl RawQuestion {
    fn into_record(self) -> core::result::Result<QuestionRecord, Reason> {
        let question = self.question.filter(|text| !text.trim().is_empty()).ok_or(Reason::MissingField("question"))?;
        let kind = self.kind.ok_or(Reason::MissingField("type"))?;
        let kind = parse_kind(&kind).ok_or(Reason::UnknownKind)?;
        let answer = self.correct_answer.ok_or(Reason::MissingField("correct_answer"))?;
        let explanation = self.explanation.map(|text| text.trim().into()).filter(|text: &Box<str>| !text.is_empty());

        let (options, correct_answer) = match kind {
            QuestionKind::TrueFalse => {
                // The option set is implied by the type, whatever the model sent.
                let flag = parse_bool(&answer).ok_or(Reason::NotBoolean)?;
                let [yes, no] = QuestionKind::BOOLEAN_OPTIONS;
                (alloc::vec![yes.into(), no.into()], if flag { yes } else { no }.into())
            }
            QuestionKind::MultipleChoice => {
                let options: Vec<Box<str>> = self
                    .options
                    .ok_or(Reason::MissingField("options"))?
                    .into_iter()
                    .map(|option| option.trim().into())
                    .collect();
                if options.len() < 2 {
                    return Err(Reason::TooFewOptions);
                }

                let answer = match answer {
                    Answer::Text(text) => text,
                    Answer::Flag(flag) => alloc::format!("{flag}"),
                };
                let answer = answer.trim();
                let correct = options.iter().find(|option| &option[..] == answer).ok_or(Reason::AnswerNotAnOption)?;
                let correct = correct.clone();
                (options, correct)
            }
        };

        Ok(QuestionRecord { question: question.trim().into(), kind, options, correct_answer, explanation })
    }
}

/// Validates a whole batch. One bad question rejects the batch, so callers never see a partial quiz.
pub fn validate(raw: Vec<RawQuestion>) -> Result<Vec<QuestionRecord>> {
    if raw.is_empty() {
        return Err(Invalid { index: 0, reason: Reason::Empty });
    }

    raw.into_iter()
        .enumerate()
        .map(|(index, question)| question.into_record().map_err(|reason| Invalid { index, reason }))
        .collect()
}

/// Parses and validates JSON text. Every source of questions (model replies, shared quizzes) goes through
/// here, so they are all held to the same rules.
pub fn decode(text: &str) -> core::result::Result<Vec<QuestionRecord>, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(|_| DecodeError::Syntax)?;
    let Value::Array(items) = value else {
        return Err(Invalid { index: 0, reason: Reason::NotAList }.into());
    };

    let raw = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| RawQuestion::deserialize(item).map_err(|_| Invalid { index, reason: Reason::Malformed }))
        .collect::<Result<Vec<_>>>()?;
    Ok(validate(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Vec<QuestionRecord>> {
        let raw: Vec<RawQuestion> = serde_json::from_value(value).unwrap();
        validate(raw)
    }

    #[test]
    fn accepts_well_formed_batch() {
        let questions = parse(json!([
            {
                "question": "What is the capital of France?",
                "type": "multiple_choice",
                "options": ["Berlin", "Madrid", "Paris", "Rome"],
                "correct_answer": "Paris",
                "explanation": "Paris has been the capital since the 10th century."
            },
            {
                "question": "The Seine flows through Paris.",
                "type": "true_false",
                "options": ["True", "False"],
                "correct_answer": "True"
            }
        ]))
        .unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].kind, QuestionKind::MultipleChoice);
        assert_eq!(&*questions[0].correct_answer, "Paris");
        assert!(questions[0].explanation().is_some());
        assert_eq!(questions[1].kind, QuestionKind::TrueFalse);
        assert!(questions[1].explanation().is_none());
    }

    #[test]
    fn normalizes_true_false_answers() {
        for (answer, expected) in [
            (json!("true"), "True"),
            (json!("TRUE"), "True"),
            (json!("False"), "False"),
            (json!("fAlSe"), "False"),
            (json!(false), "False"),
        ] {
            let question = json!({ "question": "Q?", "type": "true_false", "correct_answer": answer });
            let questions = parse(json!([question])).unwrap();
            let record = &questions[0];
            assert_eq!(&*record.correct_answer, expected);
            assert!(record.has_option(expected));
            assert_eq!(record.options.len(), 2);
        }
    }

    #[test]
    fn injects_default_true_false_options() {
        let questions = parse(json!([{
            "question": "Water boils at 100C at sea level.",
            "type": "true_false",
            "correct_answer": "True",
        }]))
        .unwrap();
        let options: Vec<&str> = questions[0].options.iter().map(|option| &**option).collect();
        assert_eq!(options, ["True", "False"]);
    }

    #[test]
    fn one_bad_question_rejects_batch() {
        let err = parse(json!([
            { "question": "Fine?", "type": "true_false", "correct_answer": "True" },
            { "question": "Options?", "type": "multiple_choice", "correct_answer": "A" }
        ]))
        .unwrap_err();
        assert_eq!(err, Invalid { index: 1, reason: Reason::MissingField("options") });
    }

    #[test]
    fn rejects_missing_fields() {
        let err = parse(json!([{ "type": "true_false", "correct_answer": "True" }])).unwrap_err();
        assert_eq!(err.reason, Reason::MissingField("question"));

        let err = parse(json!([{ "question": "Q?", "correct_answer": "True" }])).unwrap_err();
        assert_eq!(err.reason, Reason::MissingField("type"));

        let err = parse(json!([{ "question": "Q?", "type": "true_false" }])).unwrap_err();
        assert_eq!(err.reason, Reason::MissingField("correct_answer"));
    }

    #[test]
    fn rejects_answers_outside_options() {
        let err = parse(json!([{
            "question": "Pick one",
            "type": "multiple_choice",
            "options": ["A", "B", "C", "D"],
            "correct_answer": "E"
        }]))
        .unwrap_err();
        assert_eq!(err.reason, Reason::AnswerNotAnOption);

        let err = parse(json!([{ "question": "Q?", "type": "true_false", "correct_answer": "Maybe" }])).unwrap_err();
        assert_eq!(err.reason, Reason::NotBoolean);
    }

    #[test]
    fn rejects_unknown_kinds_and_empty_batches() {
        let err = parse(json!([{ "question": "Q?", "type": "essay", "correct_answer": "x" }])).unwrap_err();
        assert_eq!(err.reason, Reason::UnknownKind);
        assert_eq!(parse(json!([])).unwrap_err().reason, Reason::Empty);
    }

    #[test]
    fn reports_one_based_position() {
        let err = Invalid { index: 2, reason: Reason::UnknownKind };
        assert_eq!(err.to_string(), "question 3: unknown question type");
    }

    #[test]
    fn decode_separates_syntax_from_shape() {
        assert_eq!(decode("[{\"question\": ").unwrap_err(), DecodeError::Syntax);
        assert_eq!(
            decode("{\"question\": \"Q?\"}").unwrap_err(),
            DecodeError::Invalid(Invalid { index: 0, reason: Reason::NotAList })
        );
        assert_eq!(
            decode("[{\"question\": \"Q?\", \"type\": \"true_false\", \"correct_answer\": \"True\"}, 42]").unwrap_err(),
            DecodeError::Invalid(Invalid { index: 1, reason: Reason::Malformed })
        );
    }

    #[test]
    fn decode_round_trips_validated_records() {
        let original = alloc::vec![QuestionRecord::true_false("Paris is in France.", true, Some("It is the capital."))];
        let text = serde_json::to_string(&original).unwrap();
        assert_eq!(decode(&text).unwrap(), original);
    }
}
