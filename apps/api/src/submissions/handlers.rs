//! Axum route handlers for student submissions.

use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::documents::{extract_document_text, is_pdf};
use crate::errors::AppError;
use crate::models::submission::SubmissionRow;
use crate::state::AppState;
use crate::submissions::store::{self, NewSubmission};

const DEFAULT_EXTENSION: &str = "txt";

#[derive(Debug, Deserialize)]
pub struct SubmissionListQuery {
    pub course_id: Option<String>,
    pub assignment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionFileQuery {
    pub course_id: Option<String>,
    pub assignment_id: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<SubmissionRow>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionUploadedResponse {
    pub success: bool,
    pub message: String,
    pub submission: SubmissionRow,
}

#[derive(Debug, Default)]
struct UploadForm {
    course_id: String,
    assignment_id: String,
    student_id: String,
    student_name: String,
    file: Option<UploadedFile>,
}

#[derive(Debug)]
struct UploadedFile {
    original_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl UploadForm {
    fn is_complete(&self) -> bool {
        let filled = [
            &self.course_id,
            &self.assignment_id,
            &self.student_id,
            &self.student_name,
        ]
        .iter()
        .all(|v| !v.is_empty());
        filled && self.file.as_ref().is_some_and(|f| !f.bytes.is_empty())
    }
}

/// GET /api/submissions?course_id=&assignment_id=
pub async fn handle_list_submissions(
    State(state): State<AppState>,
    Query(params): Query<SubmissionListQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    let (Some(course_id), Some(assignment_id)) = (
        non_blank(params.course_id),
        non_blank(params.assignment_id),
    ) else {
        return Err(AppError::Validation(
            "course_id and assignment_id are required".to_string(),
        ));
    };

    let submissions = store::list_submissions(&state.db, &course_id, &assignment_id).await?;
    Ok(Json(SubmissionListResponse { submissions }))
}

/// POST /api/submissions/upload (multipart/form-data)
///
/// Fields: course_id, assignment_id, student_id, student_name and `file`.
/// The file is stored as received; its text is extracted for grading.
pub async fn handle_upload_submission(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmissionUploadedResponse>, AppError> {
    let mut form = read_upload_form(multipart).await?;
    if !form.is_complete() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    let Some(file) = form.file.take() else {
        return Err(AppError::Validation("Missing required fields".to_string()));
    };

    if !store::assignment_in_course(&state.db, &form.course_id, &form.assignment_id).await? {
        return Err(AppError::NotFound(format!(
            "Assignment {} not found in course {}",
            form.assignment_id, form.course_id
        )));
    }

    let extension = file_extension(&file.original_name);
    let file_name = stored_file_name(&form.student_id, Utc::now().timestamp_millis(), &extension);
    let content_type = file
        .content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or_else(|| content_type_for(&extension).to_string());

    let content = submission_text(&form, &file_name, &content_type, &file.bytes).await;

    let submission = store::insert_submission(
        &state.db,
        NewSubmission {
            course_id: &form.course_id,
            assignment_id: &form.assignment_id,
            student_id: &form.student_id,
            student_name: &form.student_name,
            file_name: &file_name,
            content_type: &content_type,
            file_data: &file.bytes,
            content: &content,
        },
    )
    .await?;

    info!(
        "Stored submission {} for {} in {}/{} ({} bytes)",
        submission.file_name,
        submission.student_id,
        submission.course_id,
        submission.assignment_id,
        file.bytes.len()
    );

    Ok(Json(SubmissionUploadedResponse {
        success: true,
        message: "Submission uploaded successfully".to_string(),
        submission,
    }))
}

/// GET /api/submissions/file?course_id=&assignment_id=&filename=
///
/// Serves the uploaded file inline with its stored content type.
pub async fn handle_get_submission_file(
    State(state): State<AppState>,
    Query(params): Query<SubmissionFileQuery>,
) -> Result<Response, AppError> {
    let (Some(course_id), Some(assignment_id), Some(file_name)) = (
        non_blank(params.course_id),
        non_blank(params.assignment_id),
        non_blank(params.filename),
    ) else {
        return Err(AppError::Validation(
            "course_id, assignment_id, and filename are required".to_string(),
        ));
    };

    let file = store::submission_file(&state.db, &course_id, &assignment_id, &file_name)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file.file_name),
            ),
        ],
        file.file_data,
    )
        .into_response())
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            form.file = Some(UploadedFile {
                original_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
        let value = value.trim().to_string();
        match name.as_str() {
            "course_id" => form.course_id = value,
            "assignment_id" => form.assignment_id = value,
            "student_id" => form.student_id = value,
            "student_name" => form.student_name = value,
            _ => {}
        }
    }

    Ok(form)
}

/// Extracted text, or a placeholder naming the student when a PDF cannot be read.
async fn submission_text(
    form: &UploadForm,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> String {
    match extract_document_text(Some(content_type), Some(file_name), bytes.to_vec()).await {
        Ok(text) => text,
        Err(e) if is_pdf(Some(content_type), Some(file_name)) => {
            warn!("Keeping PDF submission {file_name} without text: {e}");
            unreadable_pdf_placeholder(&form.student_name, &form.student_id)
        }
        Err(e) => {
            warn!("Keeping submission {file_name} without text: {e}");
            String::new()
        }
    }
}

fn unreadable_pdf_placeholder(student_name: &str, student_id: &str) -> String {
    format!("[PDF submission by {student_name} ({student_id})]")
}

/// Lower-cased extension of the uploaded name, limited to ASCII alphanumerics.
fn file_extension(original_name: &str) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// `<student_id>_<millis>.<ext>`, with anything outside `[A-Za-z0-9_-]` in the
/// student id replaced so the name is safe in a Content-Disposition header.
fn stored_file_name(student_id: &str, millis: i64, extension: &str) -> String {
    let safe_id: String = student_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{safe_id}_{millis}.{extension}")
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" | "docx" => "application/msword",
        _ => "application/octet-stream",
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
