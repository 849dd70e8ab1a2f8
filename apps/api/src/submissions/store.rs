use sqlx::PgPool;

use crate::models::submission::{SubmissionFile, SubmissionRow};

pub struct NewSubmission<'a> {
    pub course_id: &'a str,
    pub assignment_id: &'a str,
    pub student_id: &'a str,
    pub student_name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub file_data: &'a [u8],
    pub content: &'a str,
}

/// Submissions for one assignment, oldest first. The student name comes from
/// the roster when the student is known there, else from the upload.
pub async fn list_submissions(
    pool: &PgPool,
    course_id: &str,
    assignment_id: &str,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(
        r#"
        SELECT s.submission_id, s.course_id, s.assignment_id, s.student_id,
               COALESCE(st.name, NULLIF(s.student_name, ''),
                        'Student ' || REPLACE(s.student_id, 'S', '')) AS student_name,
               s.file_name, s.content_type, s.content, s.submitted_at
        FROM submissions s
        LEFT JOIN students st ON st.student_id = s.student_id
        WHERE s.course_id = $1 AND s.assignment_id = $2
        ORDER BY s.submitted_at, s.submission_id
        "#,
    )
    .bind(course_id)
    .bind(assignment_id)
    .fetch_all(pool)
    .await
}

pub async fn assignment_in_course(
    pool: &PgPool,
    course_id: &str,
    assignment_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM assignments WHERE course_id = $1 AND assignment_id = $2)",
    )
    .bind(course_id)
    .bind(assignment_id)
    .fetch_one(pool)
    .await
}

pub async fn insert_submission(
    pool: &PgPool,
    submission: NewSubmission<'_>,
) -> Result<SubmissionRow, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(
        r#"
        INSERT INTO submissions
            (course_id, assignment_id, student_id, student_name, file_name,
             content_type, file_data, content)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING submission_id, course_id, assignment_id, student_id, student_name,
                  file_name, content_type, content, submitted_at
        "#,
    )
    .bind(submission.course_id)
    .bind(submission.assignment_id)
    .bind(submission.student_id)
    .bind(submission.student_name)
    .bind(submission.file_name)
    .bind(submission.content_type)
    .bind(submission.file_data)
    .bind(submission.content)
    .fetch_one(pool)
    .await
}

pub async fn submission_file(
    pool: &PgPool,
    course_id: &str,
    assignment_id: &str,
    file_name: &str,
) -> Result<Option<SubmissionFile>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionFile>(
        r#"
        SELECT file_name, content_type, file_data
        FROM submissions
        WHERE course_id = $1 AND assignment_id = $2 AND file_name = $3
        "#,
    )
    .bind(course_id)
    .bind(assignment_id)
    .bind(file_name)
    .fetch_optional(pool)
    .await
}
