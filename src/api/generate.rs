//! Prompt relay endpoint
//!
//! `POST /api/generate` takes `{"prompt": ...}` and answers with
//! `{"response": ...}` from the configured text generator.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;

/// Build generate router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .with_state(state)
}

/// Generate request
#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Generate response
#[derive(Debug, Deserialize, Serialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Relay a prompt to the text generator
///
/// The body is parsed by hand so that a missing body, a wrong content type or
/// a non-string prompt all surface as the same 400 rather than an extractor
/// rejection.
async fn generate(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, GenerateError> {
    let prompt = parse_prompt(&body).ok_or(GenerateError::PromptRequired)?;

    let response = state.generator.generate(&prompt).await.map_err(|e| {
        tracing::error!(error = %e, model = state.generator.model(), "generation failed");
        GenerateError::GenerationFailed
    })?;

    Ok(Json(GenerateResponse { response }))
}

/// Extract a non-empty prompt from a raw request body
fn parse_prompt(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<GenerateRequest>(body)
        .ok()?
        .prompt
        .filter(|p| !p.is_empty())
}

/// Generate API errors
#[derive(Debug)]
pub enum GenerateError {
    PromptRequired,
    GenerationFailed,
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        let (status, error) = match self {
            Self::PromptRequired => (StatusCode::BAD_REQUEST, "Prompt is required"),
            Self::GenerationFailed => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate response"),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
