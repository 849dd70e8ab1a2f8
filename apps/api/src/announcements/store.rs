use sqlx::PgPool;

use crate::models::announcement::AnnouncementRow;

pub struct NewAnnouncement<'a> {
    pub title: &'a str,
    pub message: &'a str,
    pub course_id: Option<&'a str>,
    pub sender_role: &'a str,
    pub sender_id: Option<&'a str>,
    pub sender_name: Option<&'a str>,
    pub target: &'a str,
    pub to_email: Option<&'a str>,
}

/// Newest first. With a course filter, portal-wide announcements are included.
pub async fn list_announcements(
    pool: &PgPool,
    course_id: Option<&str>,
) -> Result<Vec<AnnouncementRow>, sqlx::Error> {
    sqlx::query_as::<_, AnnouncementRow>(
        r#"
        SELECT * FROM announcements
        WHERE $1::TEXT IS NULL OR course_id IS NULL OR course_id = $1
        ORDER BY created_at DESC, announcement_id DESC
        "#,
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_announcement(
    pool: &PgPool,
    announcement: NewAnnouncement<'_>,
) -> Result<AnnouncementRow, sqlx::Error> {
    sqlx::query_as::<_, AnnouncementRow>(
        r#"
        INSERT INTO announcements
            (title, message, course_id, sender_role, sender_id, sender_name, target, to_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(announcement.title)
    .bind(announcement.message)
    .bind(announcement.course_id)
    .bind(announcement.sender_role)
    .bind(announcement.sender_id)
    .bind(announcement.sender_name)
    .bind(announcement.target)
    .bind(announcement.to_email)
    .fetch_one(pool)
    .await
}
