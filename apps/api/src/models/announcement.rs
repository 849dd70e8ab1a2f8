use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct AnnouncementRow {
    pub announcement_id: i64,
    pub title: String,
    pub message: String,
    pub course_id: Option<String>,
    pub sender_role: String,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub target: String,
    pub to_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Announcement as the portal front end expects it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub message: String,
    pub course_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sender_role: String,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub target: String,
    pub to_email: Option<String>,
}

impl From<AnnouncementRow> for Announcement {
    fn from(row: AnnouncementRow) -> Self {
        Self {
            id: format!("A{}", row.announcement_id),
            title: row.title,
            message: row.message,
            course_id: row.course_id,
            created_at: row.created_at,
            sender_role: row.sender_role,
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            target: row.target,
            to_email: row.to_email,
        }
    }
}
