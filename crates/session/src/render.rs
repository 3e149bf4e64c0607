//! Pure projection of a [`QuizState`] into what the interface shows.

use crate::{AnswerState, QuestionKind, QuestionRecord, QuizState, Status};
use serde::Serialize;

pub const EMPTY_NOTICE: &str = "No quiz questions available. Please generate a quiz first.";

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Feedback<'q> {
    /// The explanation is withheld on purpose.
    Correct,
    Incorrect { correct_answer: &'q str, explanation: Option<&'q str> },
}

#[derive(Debug, Serialize)]
pub struct QuestionView<'q> {
    pub index: usize,
    /// One-based number for display.
    pub number: usize,
    pub question: &'q str,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<&'q str>,
    pub selected: Option<&'q str>,
    pub status: Status,
    pub can_check: bool,
    pub can_retry: bool,
    /// Solved questions collapse so the user can focus on the rest.
    pub expanded: bool,
    pub feedback: Option<Feedback<'q>>,
}

#[derive(Debug, Serialize)]
pub struct ScoreView {
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
    pub progress: f32,
}

#[derive(Debug, Serialize)]
pub struct View<'q> {
    pub questions: Vec<QuestionView<'q>>,
    pub score: ScoreView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

fn question_view<'q>(
    index: usize,
    question: &'q QuestionRecord,
    answer: &'q AnswerState,
    require_selection: bool,
) -> QuestionView<'q> {
    let status = answer.status();
    let feedback = match status {
        Status::Correct => Some(Feedback::Correct),
        Status::Incorrect => Some(Feedback::Incorrect {
            correct_answer: &question.correct_answer,
            explanation: question.explanation(),
        }),
        Status::Unanswered | Status::Answered => None,
    };

    QuestionView {
        index,
        number: index + 1,
        question: &question.question,
        kind: question.kind,
        options: question.options.iter().map(|option| &**option).collect(),
        selected: answer.selected.as_deref(),
        status,
        can_check: !answer.checked && (answer.selected.is_some() || !require_selection),
        can_retry: status == Status::Incorrect,
        expanded: status != Status::Correct,
        feedback,
    }
}

pub fn render(state: &QuizState) -> View<'_> {
    let require_selection = state.policy().require_selection;
    let questions = state
        .iter()
        .enumerate()
        .map(|(index, (question, answer))| question_view(index, question, answer, require_selection))
        .collect();

    let score = state.score();
    View {
        questions,
        score: ScoreView {
            correct: score.correct,
            total: score.total,
            percent: score.percent(),
            progress: score.progress(),
        },
        notice: state.is_empty().then_some(EMPTY_NOTICE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Policy;

    fn state() -> QuizState {
        let mut state = QuizState::new(Policy::default());
        state.set_questions(vec![
            QuestionRecord::true_false("Paris is the capital of France.", true, Some("It says so in the text.")),
            QuestionRecord::true_false("Lyon is the capital of France.", false, Some("Paris is.")),
        ]);
        state
    }

    #[test]
    fn empty_quiz_shows_notice() {
        let state = QuizState::default();
        let view = render(&state);
        assert!(view.questions.is_empty());
        assert_eq!(view.notice, Some(EMPTY_NOTICE));
        assert_eq!(view.score.percent, 0);
    }

    #[test]
    fn fresh_questions_are_open() {
        let state = state();
        let view = render(&state);
        assert_eq!(view.notice, None);
        let first = &view.questions[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.options, ["True", "False"]);
        assert_eq!(first.status, Status::Unanswered);
        assert!(first.can_check && first.expanded && !first.can_retry);
        assert!(first.feedback.is_none());
    }

    #[test]
    fn correct_answers_collapse_without_explanation() {
        let mut state = state();
        state.select_answer(0, "True").unwrap();
        state.check_answer(0).unwrap();

        let view = render(&state);
        let first = &view.questions[0];
        assert_eq!(first.feedback, Some(Feedback::Correct));
        assert!(!first.expanded && !first.can_check && !first.can_retry);
        assert_eq!(view.score.correct, 1);
        assert_eq!(view.score.percent, 50);
        assert!((view.score.progress - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn incorrect_answers_reveal_solution() {
        let mut state = state();
        state.select_answer(1, "True").unwrap();
        state.check_answer(1).unwrap();

        let view = render(&state);
        let second = &view.questions[1];
        let expected = Feedback::Incorrect { correct_answer: "False", explanation: Some("Paris is.") };
        assert_eq!(second.feedback, Some(expected));
        assert!(second.expanded && second.can_retry);
    }

    #[test]
    fn strict_policy_disables_check_until_selection() {
        let mut state = QuizState::new(Policy { require_selection: true, ..Policy::default() });
        state.set_questions(vec![QuestionRecord::true_false("Q?", true, None)]);
        assert!(!render(&state).questions[0].can_check);
        state.select_answer(0, "False").unwrap();
        assert!(render(&state).questions[0].can_check);
    }

    #[test]
    fn serializes_for_the_browser() {
        let mut state = state();
        state.select_answer(1, "True").unwrap();
        state.check_answer(1).unwrap();
        let json = serde_json::to_value(render(&state)).unwrap();
        assert_eq!(json["questions"][1]["type"], "true_false");
        assert_eq!(json["questions"][1]["status"], "incorrect");
        assert_eq!(json["questions"][1]["feedback"]["outcome"], "incorrect");
        assert_eq!(json["questions"][1]["feedback"]["correct_answer"], "False");
        assert!(json.get("notice").is_none());
    }
}
