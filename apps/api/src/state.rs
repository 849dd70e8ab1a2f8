use std::sync::Arc;

use sqlx::PgPool;

use crate::errors::AppError;
use crate::llm_client::TextGenerator;

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "GEMINI_API_KEY is not set. Add it to the environment or .env and restart the service.";

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when no Gemini credential was configured.
    pub llm: Option<Arc<dyn TextGenerator>>,
}

impl AppState {
    /// The configured model client, or a configuration error for the request.
    pub fn generator(&self) -> Result<&dyn TextGenerator, AppError> {
        self.llm
            .as_deref()
            .ok_or_else(|| AppError::Configuration(MISSING_CREDENTIAL_MESSAGE.to_string()))
    }

    /// State backed by a pool that never connects. Only for routes whose tested
    /// paths do not touch the database.
    #[cfg(test)]
    pub fn for_tests(llm: Option<Arc<dyn TextGenerator>>) -> Self {
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/feedback_api_test")
            .expect("lazy pool");
        Self { db, llm }
    }
}
