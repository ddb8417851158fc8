//! Login / session-check endpoint.

use crate::auth::{now_millis, AppState};
use crate::error::AppError;
use crate::models::{AuthRequest, LoginResponse, VerifyResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use zeroize::Zeroizing;

/// POST /api/auth — Log in with `{key, fp}` or check a session with `{token, fp}`
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    // Unconfigured secrets take precedence over anything the request says.
    let auth = state.auth()?;

    let Json(req) = payload.map_err(|_| AppError::MissingParameters)?;
    let key = req.key.filter(|k| !k.is_empty()).map(Zeroizing::new);
    let token = req.token.filter(|t| !t.is_empty());
    let fp = req
        .fp
        .filter(|f| !f.is_empty())
        .ok_or(AppError::MissingParameters)?;

    if let Some(token) = token {
        let claims = auth.validator().validate(&token, &fp, now_millis())?;
        tracing::debug!(action = "session_valid", key = %short_hash(&claims.key_hash), "Session verified");
        return Ok(Json(VerifyResponse {
            status: "ok".to_string(),
            valid: true,
        })
        .into_response());
    }

    let Some(key) = key else {
        return Err(AppError::MissingParameters);
    };

    match auth.issuer().issue(&key, &fp, now_millis()) {
        Ok(session) => {
            tracing::info!(action = "login_success", exp = session.exp, "Session issued");
            Ok(Json(LoginResponse {
                success: true,
                session,
            })
            .into_response())
        }
        Err(e) => {
            tracing::warn!(action = "login_failed", reason = e.reason(), "Login rejected");
            Err(e.into())
        }
    }
}

/// First eight characters of a key hash, enough to correlate log lines.
fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
