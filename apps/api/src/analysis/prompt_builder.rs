//! Prompt Builder: turns one submission plus its assignment context into the
//! grading instruction sent to the model.

use crate::analysis::aggregator::{AssignmentContext, Submission};
use crate::analysis::prompts::GRADING_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{
    fill_template, SUPPORTIVE_TONE_INSTRUCTION, UNTRUSTED_CONTENT_INSTRUCTION,
};

/// Cap on the submission body, in characters.
pub const MAX_SUBMISSION_CHARS: usize = 6000;
/// Cap on every other free-text field, in characters.
pub const MAX_FIELD_CHARS: usize = 3000;

/// Everything the grading prompt needs for a single submission.
/// Fields are already truncated to their caps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingRequest {
    pub assignment_name: String,
    pub rubric_text: String,
    pub syllabus_excerpt: String,
    pub student_name: String,
    pub student_id: String,
    pub submission_text: String,
}

impl GradingRequest {
    pub fn new(context: &AssignmentContext, submission: &Submission) -> Self {
        Self {
            assignment_name: take_chars(&context.assignment_name, MAX_FIELD_CHARS).to_string(),
            rubric_text: take_chars(&context.rubric_text, MAX_FIELD_CHARS).to_string(),
            syllabus_excerpt: take_chars(&context.syllabus_excerpt, MAX_FIELD_CHARS).to_string(),
            student_name: take_chars(&submission.student_name, MAX_FIELD_CHARS).to_string(),
            student_id: take_chars(&submission.student_id, MAX_FIELD_CHARS).to_string(),
            submission_text: take_chars(&submission.submission_text, MAX_SUBMISSION_CHARS)
                .to_string(),
        }
    }
}

/// Renders the grading prompt. Pure function of the request.
pub fn build_grading_prompt(request: &GradingRequest) -> String {
    fill_template(
        GRADING_PROMPT_TEMPLATE,
        &[
            ("tone_instruction", SUPPORTIVE_TONE_INSTRUCTION),
            ("untrusted_instruction", UNTRUSTED_CONTENT_INSTRUCTION),
            ("assignment_name", &request.assignment_name),
            ("rubric", &request.rubric_text),
            ("syllabus", &request.syllabus_excerpt),
            ("student_name", &request.student_name),
            ("student_id", &request.student_id),
            ("submission", &request.submission_text),
        ],
    )
}

/// Prefix of at most `max` characters. Never splits a multi-byte character.
pub fn take_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
