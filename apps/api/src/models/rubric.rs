use serde::Serialize;
use sqlx::FromRow;

/// One weighted grading criterion of an assignment's rubric.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RubricCriterionRow {
    pub rubric_id: String,
    pub assignment_id: String,
    pub criterion_name: String,
    pub weight: i32,
    pub description: String,
    pub indicators: Vec<String>,
}
