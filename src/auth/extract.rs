//! Shared handler state and the extractor guarding privileged actions.

use super::{now_millis, AuthService, SessionClaims};
use crate::error::AppError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the auth secrets are missing; every auth route then
    /// answers 503.
    pub auth: Option<Arc<AuthService>>,
}

impl AppState {
    pub fn auth(&self) -> Result<&AuthService, AppError> {
        self.auth.as_deref().ok_or(AppError::ConfigurationMissing)
    }
}

/// A privileged request whose `{token, fp}` passed the full session check.
///
/// The JSON body carries `token`, `fp` and the action payload side by side.
/// The payload is only deserialized after the session is accepted.
pub struct Privileged<T> {
    pub claims: SessionClaims,
    pub payload: T,
}

impl<T> FromRequest<AppState> for Privileged<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = state.auth()?;

        let Json(mut body) = Json::<Map<String, Value>>::from_request(req, state)
            .await
            .map_err(|_| AppError::MissingParameters)?;

        let token = take_string(&mut body, "token").ok_or(AppError::MissingParameters)?;
        let fp = take_string(&mut body, "fp").ok_or(AppError::MissingParameters)?;

        let claims = auth.validator().validate(&token, &fp, now_millis())?;

        let payload =
            T::deserialize(Value::Object(body)).map_err(|_| AppError::MissingParameters)?;

        Ok(Privileged { claims, payload })
    }
}

/// Remove `key` from the body if it holds a non-empty string.
fn take_string(body: &mut Map<String, Value>, key: &str) -> Option<String> {
    match body.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_string() {
        let mut body = json!({"token": "abc", "fp": "", "n": 3})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(take_string(&mut body, "token").as_deref(), Some("abc"));
        assert!(!body.contains_key("token"));
        assert_eq!(take_string(&mut body, "fp"), None);
        assert_eq!(take_string(&mut body, "n"), None);
        assert_eq!(take_string(&mut body, "missing"), None);
    }

    #[test]
    fn test_unconfigured_state_fails_closed() {
        let state = AppState { auth: None };
        assert!(matches!(state.auth(), Err(AppError::ConfigurationMissing)));
    }
}
