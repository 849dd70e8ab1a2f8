//! Axum route handler for the assignment analyzer.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::aggregator::{analyze_batch, AssignmentContext, BatchSummary, Submission};
use crate::catalog::{load_syllabus_or_empty, resolve_rubric_text};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub rubric: String,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub assignment_name: String,
    pub course_id: Option<String>,
    pub assignment_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentScore {
    pub student_name: String,
    pub student_id: String,
    pub score: u32,
    pub feedback: String,
    pub errors_marked: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub overall_score: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub student_scores: Vec<StudentScore>,
}

impl From<BatchSummary> for AnalyzeResponse {
    fn from(summary: BatchSummary) -> Self {
        Self {
            overall_score: summary.overall_score,
            strengths: summary.strengths,
            improvements: summary.improvements,
            student_scores: summary
                .per_submission
                .into_iter()
                .map(|s| StudentScore {
                    student_name: s.student.student_name,
                    student_id: s.student.student_id,
                    score: s.analysis.score,
                    feedback: s.analysis.raw_feedback,
                    errors_marked: s.analysis.issue_count,
                    strengths: s.analysis.strengths,
                    improvements: s.analysis.improvements,
                })
                .collect(),
        }
    }
}

/// POST /api/analyze-assignment
///
/// Grades every submission with the model, one at a time, and returns per-student
/// results plus the batch average. A failing submission scores 0 and does not
/// abort the batch.
pub async fn handle_analyze_assignment(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let generator = state.generator()?;

    if request.submissions.is_empty() {
        return Err(AppError::Validation(
            "submissions cannot be empty".to_string(),
        ));
    }

    let syllabus_excerpt = load_syllabus_or_empty(&state.db, request.course_id.as_deref()).await;
    let rubric_text =
        resolve_rubric_text(&state.db, &request.rubric, request.assignment_id.as_deref()).await;

    let context = AssignmentContext {
        assignment_name: request.assignment_name,
        rubric_text,
        syllabus_excerpt,
    };

    info!(
        "Analyzing {} submissions for '{}'",
        request.submissions.len(),
        context.assignment_name
    );

    let summary = analyze_batch(generator, &context, &request.submissions).await;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::routes::build_router;
    use crate::state::AppState;

    async fn post(state: AppState, body: Value) -> (StatusCode, Value) {
        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/analyze-assignment")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn three_submissions() -> Value {
        json!({
            "rubric": "Correctness (60%): right answers\n\nClarity (40%): clear prose",
            "assignmentName": "A1: Essay",
            "submissions": [
                {"studentName": "Ada", "studentId": "S001", "submissionText": "First essay"},
                {"studentName": "Bob", "studentId": "S002", "submissionText": "Second essay"},
                {"studentName": "Cy", "studentId": "S003", "submissionText": "Third essay"}
            ]
        })
    }

    #[tokio::test]
    async fn test_missing_credential_is_500_with_message() {
        let (status, body) = post(AppState::for_tests(None), three_submissions()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_empty_submissions_is_400() {
        let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::default());
        let (status, _) = post(
            AppState::for_tests(Some(generator)),
            json!({"rubric": "r", "submissions": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_one_failing_submission_keeps_batch_shape() {
        let generator: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::new(vec![
            Ok("Estimated Score (0-100): 80\nIssues Detected (1):\n- Short".to_string()),
            Err(LlmError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            }),
            Ok("Estimated Score (0-100): 90".to_string()),
        ]));

        let (status, body) = post(AppState::for_tests(Some(generator)), three_submissions()).await;

        assert_eq!(status, StatusCode::OK);
        let scores = body["studentScores"].as_array().unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0]["studentId"], "S001");
        assert_eq!(scores[0]["score"], 80);
        assert_eq!(scores[0]["errorsMarked"], 1);
        assert_eq!(scores[1]["score"], 0);
        assert!(scores[1]["feedback"]
            .as_str()
            .unwrap()
            .contains("model overloaded"));
        assert_eq!(scores[1]["strengths"].as_array().unwrap().len(), 0);
        assert_eq!(body["overallScore"], 85);
        assert_eq!(body["strengths"].as_array().unwrap().len(), 3);
    }
}
