//! Login: exchange a secret key for a device-bound session token.

use super::gate::HashGate;
use super::token::{SessionClaims, TokenCodec};
use super::AuthError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stages of a single login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Received,
    Hashed,
    Checked,
    Issued,
    Rejected,
}

/// A freshly minted session, as returned to the client and cached there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedSession {
    pub token: String,
    pub fp: String,
    /// Expiry in milliseconds since the Unix epoch.
    pub exp: i64,
}

/// Mints sessions for keys whose hash is on the allow-list.
///
/// Never mutates the allow-list.
pub struct SessionIssuer<'a> {
    gate: &'a HashGate,
    codec: &'a TokenCodec,
    ttl: Duration,
}

impl<'a> SessionIssuer<'a> {
    pub fn new(gate: &'a HashGate, codec: &'a TokenCodec, ttl: Duration) -> Self {
        Self { gate, codec, ttl }
    }

    /// Issue a session for `secret_key` bound to `fingerprint`.
    ///
    /// `now_ms` is the current time in milliseconds since the Unix epoch. Any
    /// refusal is reported as [`AuthError::InvalidCredentials`] with no
    /// further detail.
    pub fn issue(
        &self,
        secret_key: &str,
        fingerprint: &str,
        now_ms: i64,
    ) -> Result<IssuedSession, AuthError> {
        let mut stage = LoginStage::Received;
        tracing::debug!(?stage, "Login attempt");

        let key_hash = self.gate.hash(secret_key);
        stage = LoginStage::Hashed;
        tracing::debug!(?stage, "Key hashed");

        let authorized = !secret_key.is_empty() && self.gate.is_authorized(&key_hash);
        stage = LoginStage::Checked;
        tracing::debug!(?stage, authorized, "Allow-list checked");

        if !authorized {
            stage = LoginStage::Rejected;
            tracing::debug!(?stage, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            key_hash: key_hash.to_string(),
            fingerprint: fingerprint.to_string(),
            expiry: now_ms.saturating_add(ttl_ms),
        };
        let token = self.codec.encode(&claims)?;

        stage = LoginStage::Issued;
        tracing::debug!(?stage, exp = claims.expiry, "Session issued");

        Ok(IssuedSession {
            token,
            fp: claims.fingerprint,
            exp: claims.expiry,
        })
    }
}
