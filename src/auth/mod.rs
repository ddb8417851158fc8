//! Device-bound session protocol: key hashing, token signing, issuance and
//! validation.

pub mod extract;
pub mod fingerprint;
pub mod gate;
pub mod issuer;
pub mod token;
pub mod validator;

pub use extract::{AppState, Privileged};
pub use fingerprint::DeviceAttributes;
pub use gate::{compute_key_hash, AllowList, HashGate, KeyHash};
pub use issuer::{IssuedSession, LoginStage, SessionIssuer};
pub use token::{SessionClaims, TokenCodec};
pub use validator::SessionValidator;

use crate::config::{AuthConfig, ConfigError};
use std::time::Duration;

/// Default lifetime of an issued session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Reasons a login or a session check is refused.
///
/// Display strings are what the client sees; they never say more than the
/// variant name already does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid key")]
    InvalidCredentials,

    #[error("Invalid or tampered token")]
    MalformedToken,

    #[error("Session expired")]
    ExpiredSession,

    #[error("Session is bound to another device")]
    DeviceMismatch,

    #[error("Access revoked")]
    Revoked,
}

impl AuthError {
    /// Short label used in structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MalformedToken => "malformed_token",
            AuthError::ExpiredSession => "expired",
            AuthError::DeviceMismatch => "device_mismatch",
            AuthError::Revoked => "revoked",
        }
    }
}

/// Everything the issuer and validator need, built once at startup.
pub struct AuthService {
    gate: HashGate,
    codec: TokenCodec,
    session_ttl: Duration,
}

impl AuthService {
    /// Build from loaded configuration. Fails closed on empty salt, secret or
    /// allow-list.
    pub fn new(config: &AuthConfig, session_ttl: Duration) -> Result<Self, ConfigError> {
        let gate = HashGate::new(
            config.salt.as_str(),
            AllowList::new(config.allowed_hashes.iter().cloned()),
        )?;
        let codec = TokenCodec::new(config.signing_secret.as_bytes())?;
        Ok(Self {
            gate,
            codec,
            session_ttl,
        })
    }

    pub fn issuer(&self) -> SessionIssuer<'_> {
        SessionIssuer::new(&self.gate, &self.codec, self.session_ttl)
    }

    pub fn validator(&self) -> SessionValidator<'_> {
        SessionValidator::new(&self.gate, &self.codec)
    }

    pub fn allow_list_len(&self) -> usize {
        self.gate.allow_list().len()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
