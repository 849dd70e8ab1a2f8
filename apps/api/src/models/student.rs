use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentRow {
    pub student_id: String,
    pub name: String,
    pub email: String,
}
