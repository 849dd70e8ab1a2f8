use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A stored submission without its raw file bytes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubmissionRow {
    pub submission_id: i64,
    pub course_id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "filename")]
    pub file_name: String,
    pub content_type: String,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
}

/// The uploaded file as it was received.
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionFile {
    pub file_name: String,
    pub content_type: String,
    pub file_data: Vec<u8>,
}
