use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CourseRow {
    pub course_id: String,
    pub faculty_id: String,
    pub name: String,
    pub code: String,
    pub description: String,
    pub duration: String,
    pub strength: i32,
    pub syllabus_content: String,
    pub created_at: DateTime<Utc>,
}

/// Course as the portal front end expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub students: i32,
    pub syllabus_content: String,
    #[serde(rename = "faculty_id")]
    pub faculty_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.course_id,
            code: row.code,
            name: row.name,
            description: row.description,
            duration: row.duration,
            students: row.strength,
            syllabus_content: row.syllabus_content,
            faculty_id: row.faculty_id,
            created_at: row.created_at,
        }
    }
}
