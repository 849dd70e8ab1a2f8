//! Axum route handlers for the catalog API.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::store::{self, NewAssignment, NewCourse, NewCriterion};
use crate::catalog::documents::extract_document_text;
use crate::errors::AppError;
use crate::models::assignment::AssignmentRow;
use crate::models::course::Course;
use crate::models::rubric::RubricCriterionRow;
use crate::models::student::StudentRow;
use crate::state::AppState;

const DEFAULT_FACULTY_ID: &str = "F101";
const DEFAULT_DURATION: &str = "12 weeks";
const DEFAULT_MAX_SCORE: i32 = 100;
const DEFAULT_WEIGHT: i32 = 25;
const DEFAULT_DUE_IN_DAYS: i64 = 7;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    pub faculty_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourseIdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignmentListQuery {
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RubricListQuery {
    pub assignment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub course: Course,
}

#[derive(Debug, Serialize)]
pub struct CourseCreatedResponse {
    pub success: bool,
    pub course: Course,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct AssignmentListResponse {
    pub assignments: Vec<AssignmentRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub max_score: Option<i32>,
    pub weight: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentCreatedResponse {
    pub success: bool,
    pub assignment: AssignmentRow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRubricsRequest {
    pub assignment_id: String,
    pub criteria: Vec<CriterionInput>,
}

#[derive(Debug, Deserialize)]
pub struct CriterionInput {
    #[serde(default)]
    pub criterion_name: String,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RubricListResponse {
    pub rubrics: Vec<RubricCriterionRow>,
}

#[derive(Debug, Serialize)]
pub struct RubricsCreatedResponse {
    pub success: bool,
    pub rubrics: Vec<RubricCriterionRow>,
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub students: Vec<StudentRow>,
}

/// Multipart fields accepted by course creation.
#[derive(Debug, Default)]
struct CourseForm {
    name: String,
    code: String,
    duration: String,
    students: i32,
    faculty_id: String,
    syllabus: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Courses
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/courses?faculty_id=
pub async fn handle_list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseListQuery>,
) -> Result<Json<CourseListResponse>, AppError> {
    let faculty_id = params.faculty_id.as_deref().filter(|f| !f.is_empty());
    let rows = store::list_courses(&state.db, faculty_id).await?;
    Ok(Json(CourseListResponse {
        courses: rows.into_iter().map(Course::from).collect(),
    }))
}

/// GET /api/courses/:id
pub async fn handle_get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    let row = store::get_course(&state.db, &course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))?;
    Ok(Json(CourseResponse {
        course: row.into(),
    }))
}

/// POST /api/courses (multipart/form-data)
///
/// Fields: name, code, duration, students, faculty_id, and an optional `syllabus`
/// file whose text is extracted and stored with the course.
pub async fn handle_create_course(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CourseCreatedResponse>, AppError> {
    let form = read_course_form(multipart).await?;

    if form.name.trim().is_empty() || form.code.trim().is_empty() {
        return Err(AppError::Validation(
            "name and code are required".to_string(),
        ));
    }

    let syllabus_content = form.syllabus.unwrap_or_default();
    let description = format!("{} - {}", form.name, form.code);
    let row = store::insert_course(
        &state.db,
        NewCourse {
            course_id: &form.code,
            faculty_id: &form.faculty_id,
            name: &form.name,
            code: &form.code,
            description: &description,
            duration: &form.duration,
            strength: form.students,
            syllabus_content: &syllabus_content,
        },
    )
    .await?
    .ok_or_else(|| AppError::Validation(format!("Course {} already exists", form.code)))?;

    info!(
        "Created course {} for faculty {} (syllabus: {} chars)",
        row.course_id,
        row.faculty_id,
        row.syllabus_content.chars().count()
    );

    Ok(Json(CourseCreatedResponse {
        success: true,
        course: row.into(),
    }))
}

/// DELETE /api/courses?id=
pub async fn handle_delete_course(
    State(state): State<AppState>,
    Query(params): Query<CourseIdQuery>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Course ID is required".to_string()))?;

    let deleted = store::delete_course(&state.db, &id).await?;
    info!("Deleted course {id} ({deleted} rows)");

    Ok(Json(SuccessResponse { success: true }))
}

async fn read_course_form(mut multipart: Multipart) -> Result<CourseForm, AppError> {
    let mut form = CourseForm {
        duration: DEFAULT_DURATION.to_string(),
        faculty_id: DEFAULT_FACULTY_ID.to_string(),
        ..CourseForm::default()
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "syllabus" {
            let content_type = field.content_type().map(String::from);
            let file_name = field.file_name().map(String::from);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read syllabus: {e}")))?;
            if !bytes.is_empty() {
                let text = extract_document_text(
                    content_type.as_deref(),
                    file_name.as_deref(),
                    bytes.to_vec(),
                )
                .await?;
                form.syllabus = Some(text);
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
        let value = value.trim().to_string();
        match name.as_str() {
            "name" => form.name = value,
            "code" => form.code = value,
            "duration" if !value.is_empty() => form.duration = value,
            "faculty_id" if !value.is_empty() => form.faculty_id = value,
            "students" => form.students = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    Ok(form)
}

// ────────────────────────────────────────────────────────────────────────────
// Assignments
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/assignments?course_id=
pub async fn handle_list_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentListQuery>,
) -> Result<Json<AssignmentListResponse>, AppError> {
    let course_id = params.course_id.as_deref().filter(|c| !c.is_empty());
    let assignments = store::list_assignments(&state.db, course_id).await?;
    Ok(Json(AssignmentListResponse { assignments }))
}

/// POST /api/assignments
pub async fn handle_create_assignment(
    State(state): State<AppState>,
    Json(request): Json<CreateAssignmentRequest>,
) -> Result<Json<AssignmentCreatedResponse>, AppError> {
    if request.course_id.trim().is_empty() {
        return Err(AppError::Validation("Course ID is required".to_string()));
    }
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if store::get_course(&state.db, &request.course_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Course {} not found",
            request.course_id
        )));
    }

    let due_date = request
        .due_date
        .unwrap_or_else(|| (Utc::now() + Duration::days(DEFAULT_DUE_IN_DAYS)).date_naive());

    let assignment = store::insert_assignment(
        &state.db,
        NewAssignment {
            course_id: &request.course_id,
            title: &request.title,
            description: &request.description,
            due_date,
            max_score: request.max_score.unwrap_or(DEFAULT_MAX_SCORE),
            weight: request.weight.unwrap_or(DEFAULT_WEIGHT),
        },
    )
    .await?;

    info!(
        "Created assignment {} in course {}",
        assignment.assignment_id, assignment.course_id
    );

    Ok(Json(AssignmentCreatedResponse {
        success: true,
        assignment,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Rubrics
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/rubrics?assignment_id=
pub async fn handle_list_rubrics(
    State(state): State<AppState>,
    Query(params): Query<RubricListQuery>,
) -> Result<Json<RubricListResponse>, AppError> {
    let assignment_id = params
        .assignment_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("assignment_id is required".to_string()))?;

    let rubrics = store::list_rubrics(&state.db, &assignment_id).await?;
    Ok(Json(RubricListResponse { rubrics }))
}

/// POST /api/rubrics
///
/// Replaces the rubric for an assignment. Criteria without a name or
/// description are skipped.
pub async fn handle_create_rubrics(
    State(state): State<AppState>,
    Json(request): Json<CreateRubricsRequest>,
) -> Result<Json<RubricsCreatedResponse>, AppError> {
    if request.assignment_id.trim().is_empty() {
        return Err(AppError::Validation(
            "assignmentId and criteria array are required".to_string(),
        ));
    }

    let criteria = valid_criteria(request.criteria);
    let rubrics = store::replace_rubrics(&state.db, &request.assignment_id, &criteria).await?;

    info!(
        "Stored {} rubric criteria for assignment {}",
        rubrics.len(),
        request.assignment_id
    );

    Ok(Json(RubricsCreatedResponse {
        success: true,
        rubrics,
    }))
}

fn valid_criteria(input: Vec<CriterionInput>) -> Vec<NewCriterion> {
    input
        .into_iter()
        .filter(|c| !c.criterion_name.trim().is_empty() && !c.description.trim().is_empty())
        .map(|c| NewCriterion {
            criterion_name: c.criterion_name.trim().to_string(),
            weight: c.weight,
            description: c.description.trim().to_string(),
            indicators: c.indicators,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Students
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/students
pub async fn handle_list_students(
    State(state): State<AppState>,
) -> Result<Json<StudentListResponse>, AppError> {
    let students = store::list_students(&state.db).await?;
    Ok(Json(StudentListResponse { students }))
}
