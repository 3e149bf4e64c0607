use core::fmt::Write;
use model::QuestionKind;

/// Renders the instruction sent to the model. The field names and literal values named here are
/// exactly what [`model::validate`] accepts.
pub fn build(kinds: &[QuestionKind], content: &str, count: u32) -> String {
    let mut prompt = String::with_capacity(content.len() + 1024);

    let _ = write!(
        prompt,
        "Generate {count} quiz questions based on the following content. \
        Include only the following question types: "
    );
    for (i, kind) in kinds.iter().enumerate() {
        if i > 0 {
            prompt.push_str(", ");
        }
        let _ = write!(prompt, "\"{}\"", kind.as_tag());
    }

    prompt.push_str(
        ".\n\nFor each question, provide:\n\
        1. `question`: The question text\n\
        2. `type`: The type of question, exactly \"multiple_choice\" or \"true_false\"\n\
        3. `options`: For multiple_choice questions, an array of 4 options\n\
        4. `correct_answer`: The correct answer, copied exactly from one of the options\n\
        5. `explanation`: A brief explanation of why the answer is correct\n\n\
        For true_false questions, set `options` to [\"True\", \"False\"] \
        and `correct_answer` to either \"True\" or \"False\" (capitalized).\n\n",
    );
    let _ = writeln!(prompt, "Return exactly {count} questions as a JSON array of question objects and nothing else.");
    prompt.push_str("Content: ");
    prompt.push_str(content);
    prompt
}
