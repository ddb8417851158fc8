//! FAQ chat, the privileged action behind the session check.

use crate::auth::Privileged;
use crate::error::AppError;
use crate::models::{ChatRequest, ChatResponse};
use crate::responder::faq_reply;
use axum::Json;

/// POST /api/chat — Answer a help question for a valid session
pub async fn chat(
    Privileged { payload, .. }: Privileged<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::MissingParameters);
    }

    Ok(Json(ChatResponse {
        response: faq_reply(&payload.message).to_string(),
    }))
}
