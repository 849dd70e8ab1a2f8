//! Axum route handler for the faculty chat assistant.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::load_syllabus_or_empty;
use crate::chat::prompts::{FACULTY_ASSISTANT_SYSTEM_TEMPLATE, OFF_TOPIC_REPLY};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, SUPPORTIVE_TONE_INSTRUCTION};
use crate::llm_client::Turn;
use crate::state::AppState;

/// Only the most recent messages are sent to the model.
const MAX_HISTORY_MESSAGES: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub course_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
}

/// POST /api/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let generator = state.generator()?;

    if request.messages.is_empty() {
        return Err(AppError::Validation(
            "messages array is required".to_string(),
        ));
    }

    let syllabus = load_syllabus_or_empty(&state.db, request.course_id.as_deref()).await;
    let system = build_system_prompt(&syllabus);
    let turns = build_turns(&request.messages);

    info!(
        "Chat request: {} turns, course={:?}",
        turns.len(),
        request.course_id
    );

    let reply = generator
        .generate(Some(&system), &turns)
        .await
        .map_err(|e| AppError::Llm(format!("Chat completion failed: {e}")))?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}

fn build_system_prompt(syllabus: &str) -> String {
    fill_template(
        FACULTY_ASSISTANT_SYSTEM_TEMPLATE,
        &[
            ("tone_instruction", SUPPORTIVE_TONE_INSTRUCTION),
            ("off_topic_reply", OFF_TOPIC_REPLY),
            ("syllabus", syllabus),
        ],
    )
}

/// Last `MAX_HISTORY_MESSAGES` messages; `assistant` maps to the model role,
/// everything else is treated as the user.
fn build_turns(messages: &[ChatMessage]) -> Vec<Turn> {
    let start = messages.len().saturating_sub(MAX_HISTORY_MESSAGES);
    messages[start..]
        .iter()
        .map(|m| match m.role.as_str() {
            "assistant" | "model" => Turn::model(m.content.clone()),
            _ => Turn::user(m.content.clone()),
        })
        .collect()
}
