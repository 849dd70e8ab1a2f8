use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignmentRow {
    pub assignment_id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub max_score: i32,
    pub weight: i32,
    pub created_at: DateTime<Utc>,
}
