//! Axum route handlers for announcements.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::announcements::store::{self, NewAnnouncement};
use crate::errors::AppError;
use crate::models::announcement::Announcement;
use crate::state::AppState;

/// Who posted an announcement. Anything other than `student` is faculty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderRole {
    Faculty,
    Student,
}

impl SenderRole {
    fn from_input(value: Option<&str>) -> Self {
        match value {
            Some("student") => Self::Student,
            _ => Self::Faculty,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Faculty => "faculty",
            Self::Student => "student",
        }
    }
}

/// Who an announcement is for. Defaults to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Students,
    Faculty,
    All,
}

impl Audience {
    fn from_input(value: Option<&str>) -> Self {
        match value {
            Some("faculty") => Self::Faculty,
            Some("all") => Self::All,
            _ => Self::Students,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Faculty => "faculty",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementListQuery {
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub course_id: Option<String>,
    pub sender_role: Option<String>,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub target: Option<String>,
    pub to_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementListResponse {
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementCreatedResponse {
    pub success: bool,
    pub announcement: Announcement,
}

/// GET /api/announcements?course_id=
pub async fn handle_list_announcements(
    State(state): State<AppState>,
    Query(params): Query<AnnouncementListQuery>,
) -> Result<Json<AnnouncementListResponse>, AppError> {
    let course_id = params.course_id.as_deref().filter(|c| !c.trim().is_empty());
    let rows = store::list_announcements(&state.db, course_id).await?;
    Ok(Json(AnnouncementListResponse {
        announcements: rows.into_iter().map(Announcement::from).collect(),
    }))
}

/// POST /api/announcements
pub async fn handle_create_announcement(
    State(state): State<AppState>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<Json<AnnouncementCreatedResponse>, AppError> {
    if request.title.trim().is_empty() || request.message.trim().is_empty() {
        return Err(AppError::Validation(
            "title and message are required".to_string(),
        ));
    }

    let role = SenderRole::from_input(request.sender_role.as_deref());
    let audience = Audience::from_input(request.target.as_deref());

    let row = store::insert_announcement(
        &state.db,
        NewAnnouncement {
            title: &request.title,
            message: &request.message,
            course_id: present(&request.course_id),
            sender_role: role.as_str(),
            sender_id: present(&request.sender_id),
            sender_name: present(&request.sender_name),
            target: audience.as_str(),
            to_email: present(&request.to_email),
        },
    )
    .await?;

    info!(
        "Created announcement A{} for {} (course: {:?})",
        row.announcement_id, row.target, row.course_id
    );

    Ok(Json(AnnouncementCreatedResponse {
        success: true,
        announcement: row.into(),
    }))
}

/// Empty strings are stored as NULL.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
