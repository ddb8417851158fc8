//! Request and response models for the API.

use crate::auth::IssuedSession;
use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Body of `POST /api/auth`. `token` selects the verify path, `key` the
/// login path; `fp` is required by both.
#[derive(Debug, Default, Deserialize)]
pub struct AuthRequest {
    pub key: Option<String>,
    pub token: Option<String>,
    pub fp: Option<String>,
}

/// Response after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub session: IssuedSession,
}

/// Response after a successful session check.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: String,
    pub valid: bool,
}

// ============================================================================
// Chat Models
// ============================================================================

/// Action payload of `POST /api/chat`, read only after the session check.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
