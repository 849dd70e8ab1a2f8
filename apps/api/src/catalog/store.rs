//! Catalog persistence. Every write is a single statement or one transaction.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::assignment::AssignmentRow;
use crate::models::course::CourseRow;
use crate::models::rubric::RubricCriterionRow;
use crate::models::student::StudentRow;

pub struct NewCourse<'a> {
    pub course_id: &'a str,
    pub faculty_id: &'a str,
    pub name: &'a str,
    pub code: &'a str,
    pub description: &'a str,
    pub duration: &'a str,
    pub strength: i32,
    pub syllabus_content: &'a str,
}

pub struct NewAssignment<'a> {
    pub course_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub due_date: NaiveDate,
    pub max_score: i32,
    pub weight: i32,
}

pub struct NewCriterion {
    pub criterion_name: String,
    pub weight: i32,
    pub description: String,
    pub indicators: Vec<String>,
}

pub async fn list_courses(
    pool: &PgPool,
    faculty_id: Option<&str>,
) -> Result<Vec<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(
        "SELECT * FROM courses WHERE ($1::TEXT IS NULL OR faculty_id = $1) ORDER BY created_at, course_id",
    )
    .bind(faculty_id)
    .fetch_all(pool)
    .await
}

pub async fn get_course(pool: &PgPool, course_id: &str) -> Result<Option<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE course_id = $1")
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub async fn course_syllabus(pool: &PgPool, course_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT syllabus_content FROM courses WHERE course_id = $1")
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

/// Returns `None` when a course with the same id already exists.
pub async fn insert_course(
    pool: &PgPool,
    course: NewCourse<'_>,
) -> Result<Option<CourseRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRow>(
        r#"
        INSERT INTO courses
            (course_id, faculty_id, name, code, description, duration, strength, syllabus_content)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (course_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(course.course_id)
    .bind(course.faculty_id)
    .bind(course.name)
    .bind(course.code)
    .bind(course.description)
    .bind(course.duration)
    .bind(course.strength)
    .bind(course.syllabus_content)
    .fetch_optional(pool)
    .await
}

/// Deletes a course and, by cascade, its assignments and rubrics.
pub async fn delete_course(pool: &PgPool, course_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE course_id = $1")
        .bind(course_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_assignments(
    pool: &PgPool,
    course_id: Option<&str>,
) -> Result<Vec<AssignmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentRow>(
        "SELECT * FROM assignments WHERE ($1::TEXT IS NULL OR course_id = $1) ORDER BY course_id, assignment_id",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Inserts an assignment with id `<course_id>_A<NN>`, NN being the next ordinal
/// for that course. A concurrent insert collides on the primary key instead of
/// overwriting.
pub async fn insert_assignment(
    pool: &PgPool,
    assignment: NewAssignment<'_>,
) -> Result<AssignmentRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE course_id = $1")
            .bind(assignment.course_id)
            .fetch_one(&mut *tx)
            .await?;

    let row = sqlx::query_as::<_, AssignmentRow>(
        r#"
        INSERT INTO assignments
            (assignment_id, course_id, title, description, due_date, max_score, weight)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(assignment_id(assignment.course_id, existing + 1))
    .bind(assignment.course_id)
    .bind(assignment.title)
    .bind(assignment.description)
    .bind(assignment.due_date)
    .bind(assignment.max_score)
    .bind(assignment.weight)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn list_rubrics(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<Vec<RubricCriterionRow>, sqlx::Error> {
    sqlx::query_as::<_, RubricCriterionRow>(
        "SELECT * FROM rubric_criteria WHERE assignment_id = $1 ORDER BY position",
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await
}

/// Replaces an assignment's rubric in one transaction.
/// Criteria are numbered `<assignment_id>_R01`, `_R02`, ... in the given order.
pub async fn replace_rubrics(
    pool: &PgPool,
    assignment_id: &str,
    criteria: &[NewCriterion],
) -> Result<Vec<RubricCriterionRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM rubric_criteria WHERE assignment_id = $1")
        .bind(assignment_id)
        .execute(&mut *tx)
        .await?;

    let mut rows = Vec::with_capacity(criteria.len());
    for (index, criterion) in criteria.iter().enumerate() {
        let position = index as i32 + 1;
        let row = sqlx::query_as::<_, RubricCriterionRow>(
            r#"
            INSERT INTO rubric_criteria
                (rubric_id, assignment_id, position, criterion_name, weight, description, indicators)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(rubric_id(assignment_id, position))
        .bind(assignment_id)
        .bind(position)
        .bind(&criterion.criterion_name)
        .bind(criterion.weight)
        .bind(&criterion.description)
        .bind(&criterion.indicators)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok(rows)
}

pub async fn list_students(pool: &PgPool) -> Result<Vec<StudentRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentRow>("SELECT * FROM students ORDER BY student_id")
        .fetch_all(pool)
        .await
}

fn assignment_id(course_id: &str, ordinal: i64) -> String {
    format!("{course_id}_A{ordinal:02}")
}

fn rubric_id(assignment_id: &str, position: i32) -> String {
    format!("{assignment_id}_R{position:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_id_pads_without_truncating() {
        assert_eq!(assignment_id("CS101", 1), "CS101_A01");
        assert_eq!(assignment_id("CS101", 10), "CS101_A10");
        assert_eq!(assignment_id("CS101", 100), "CS101_A100");
        assert_ne!(assignment_id("CS101", 100), assignment_id("CS101", 10));
    }

    #[test]
    fn test_rubric_id_is_zero_padded() {
        assert_eq!(rubric_id("CS101_A01", 1), "CS101_A01_R01");
        assert_eq!(rubric_id("CS101_A01", 12), "CS101_A01_R12");
    }
}
