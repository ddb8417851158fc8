//! Client side of the session protocol.
//!
//! [`AuthClient`] logs in with a secret key, keeps the returned session in a
//! [`SessionStore`], and attaches `{token, fp}` to privileged calls. Any
//! rejection of an existing session clears the store; the caller must then
//! ask the user for the key again. Nothing is retried.

pub mod store;

pub use store::{FileStore, MemoryStore, SessionStore, StoreError, STORAGE_KEY};

use crate::auth::{now_millis, DeviceAttributes, IssuedSession};
use crate::models::{ChatResponse, LoginResponse};
use reqwest::{StatusCode, Url};
use serde_json::json;
use zeroize::Zeroizing;

/// Query parameter a login link carries the secret key in.
pub const LINK_KEY_PARAM: &str = "k";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No session, log in first")]
    NoSession,

    #[error("Session expired")]
    Expired,

    #[error("Login link carries no key")]
    NoKeyInLink,

    /// Login refused. Deliberately says nothing about why.
    #[error("Invalid key")]
    InvalidKey,

    #[error("Session rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Unexpected response status {0}")]
    UnexpectedStatus(u16),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// HTTP client bound to one device fingerprint and one session store.
pub struct AuthClient<S> {
    http: reqwest::Client,
    base_url: String,
    fingerprint: String,
    store: S,
}

impl<S: SessionStore> AuthClient<S> {
    /// Client using the fingerprint of the current machine.
    pub fn new(base_url: impl Into<String>, store: S) -> Self {
        Self::with_fingerprint(base_url, store, DeviceAttributes::detect().fingerprint())
    }

    pub fn with_fingerprint(
        base_url: impl Into<String>,
        store: S,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fingerprint: fingerprint.into(),
            store,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The cached session, if any.
    pub fn session(&self) -> Result<Option<IssuedSession>, ClientError> {
        Ok(self.store.load()?)
    }

    /// Exchange `key` for a session and cache it.
    pub async fn login(&self, key: &str) -> Result<IssuedSession, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/auth"))
            .json(&json!({ "key": key, "fp": self.fingerprint }))
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body: LoginResponse = resp.json().await?;
                self.store.save(&body.session)?;
                tracing::debug!(exp = body.session.exp, "Session cached");
                Ok(body.session)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::InvalidKey),
            StatusCode::SERVICE_UNAVAILABLE => Err(ClientError::ServiceUnavailable),
            other => Err(ClientError::UnexpectedStatus(other.as_u16())),
        }
    }

    /// Log in with the key carried by a login link (`...?k=<key>`).
    ///
    /// Returns the session and the link with the key stripped, which is what
    /// should be shown or kept in history afterwards.
    pub async fn login_from_link(
        &self,
        link: &str,
    ) -> Result<(IssuedSession, String), ClientError> {
        let (key, stripped) = split_login_link(link).ok_or(ClientError::NoKeyInLink)?;
        let session = self.login(&key).await?;
        Ok((session, stripped))
    }

    /// Ask the server whether the cached session is still good.
    pub async fn verify(&self) -> Result<IssuedSession, ClientError> {
        let session = self.current_session()?;

        let resp = self
            .http
            .post(self.url("/api/auth"))
            .json(&json!({ "token": session.token, "fp": self.fingerprint }))
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => Ok(session),
            _ => Err(self.reject(resp).await),
        }
    }

    /// Send a help question; requires a valid session.
    pub async fn chat(&self, message: &str) -> Result<String, ClientError> {
        let session = self.current_session()?;

        let resp = self
            .http
            .post(self.url("/api/chat"))
            .json(&json!({
                "token": session.token,
                "fp": self.fingerprint,
                "message": message,
            }))
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body: ChatResponse = resp.json().await?;
                Ok(body.response)
            }
            _ => Err(self.reject(resp).await),
        }
    }

    /// Forget the cached session.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.store.clear()?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Load the cached session, dropping it if it has already expired locally.
    fn current_session(&self) -> Result<IssuedSession, ClientError> {
        let session = self.store.load()?.ok_or(ClientError::NoSession)?;
        if session.exp <= now_millis() {
            self.store.clear()?;
            return Err(ClientError::Expired);
        }
        Ok(session)
    }

    /// Map a non-200 response; 401/403 also clear the cached session.
    async fn reject(&self, resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v["error"].as_str().map(str::to_string))
                    .unwrap_or_default();
                if let Err(e) = self.store.clear() {
                    return e.into();
                }
                tracing::info!(status = status.as_u16(), reason = %message, "Session cleared after rejection");
                ClientError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            }
            StatusCode::SERVICE_UNAVAILABLE => ClientError::ServiceUnavailable,
            other => ClientError::UnexpectedStatus(other.as_u16()),
        }
    }
}

/// Split a login link into its secret key and the link without it.
///
/// `None` when the link does not parse or has no non-empty `k` parameter.
/// Other query parameters are kept in order.
pub fn split_login_link(link: &str) -> Option<(Zeroizing<String>, String)> {
    let mut url = Url::parse(link).ok()?;

    let mut key = None;
    let rest: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(name, value)| {
            if name != LINK_KEY_PARAM {
                return Some((name.into_owned(), value.into_owned()));
            }
            if key.is_none() && !value.is_empty() {
                key = Some(Zeroizing::new(value.into_owned()));
            }
            None
        })
        .collect();
    let key = key?;

    if rest.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(rest);
    }
    Some((key, url.to_string()))
}
