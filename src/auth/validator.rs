//! Per-request session check.

use super::gate::{HashGate, KeyHash};
use super::token::{SessionClaims, TokenCodec};
use super::AuthError;

/// Decides whether a `{token, fingerprint}` pair still grants access.
///
/// Checks run in a fixed order: signature, expiry, device, allow-list. The
/// allow-list is consulted on every call so that removing a hash revokes its
/// sessions immediately.
pub struct SessionValidator<'a> {
    gate: &'a HashGate,
    codec: &'a TokenCodec,
}

impl<'a> SessionValidator<'a> {
    pub fn new(gate: &'a HashGate, codec: &'a TokenCodec) -> Self {
        Self { gate, codec }
    }

    pub fn validate(
        &self,
        token: &str,
        fingerprint: &str,
        now_ms: i64,
    ) -> Result<SessionClaims, AuthError> {
        let result = self.check(token, fingerprint, now_ms);
        if let Err(e) = &result {
            tracing::warn!(action = "session_rejected", reason = e.reason(), "Session rejected");
        }
        result
    }

    fn check(
        &self,
        token: &str,
        fingerprint: &str,
        now_ms: i64,
    ) -> Result<SessionClaims, AuthError> {
        let claims = self.codec.decode(token)?;

        if now_ms >= claims.expiry {
            return Err(AuthError::ExpiredSession);
        }

        if claims.fingerprint != fingerprint {
            return Err(AuthError::DeviceMismatch);
        }

        let key_hash = KeyHash::from(claims.key_hash.clone());
        if !self.gate.is_authorized(&key_hash) {
            return Err(AuthError::Revoked);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::gate::{compute_key_hash, AllowList};
    use crate::auth::issuer::SessionIssuer;
    use crate::auth::DEFAULT_SESSION_TTL;

    const NOW: i64 = 1_700_000_000_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn gate_with(keys: &[&str]) -> HashGate {
        HashGate::new(
            "s",
            AllowList::new(keys.iter().map(|k| compute_key_hash(k, "s").to_string())),
        )
        .unwrap()
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(b"signing").unwrap()
    }

    fn issue(gate: &HashGate, codec: &TokenCodec, key: &str, fp: &str) -> String {
        SessionIssuer::new(gate, codec, DEFAULT_SESSION_TTL)
            .issue(key, fp, NOW)
            .unwrap()
            .token
    }

    #[test]
    fn test_valid_session_accepted() {
        let (gate, codec) = (gate_with(&["abc123"]), codec());
        let token = issue(&gate, &codec, "abc123", "fp1");

        let claims = SessionValidator::new(&gate, &codec)
            .validate(&token, "fp1", NOW + DAY_MS - 1)
            .unwrap();
        assert_eq!(claims.fingerprint, "fp1");
    }

    #[test]
    fn test_other_device_rejected() {
        let (gate, codec) = (gate_with(&["abc123"]), codec());
        let token = issue(&gate, &codec, "abc123", "fp1");

        assert_eq!(
            SessionValidator::new(&gate, &codec).validate(&token, "fp2", NOW),
            Err(AuthError::DeviceMismatch)
        );
    }

    #[test]
    fn test_expired_rejected_at_and_after_expiry() {
        let (gate, codec) = (gate_with(&["abc123"]), codec());
        let token = issue(&gate, &codec, "abc123", "fp1");
        let validator = SessionValidator::new(&gate, &codec);

        assert_eq!(
            validator.validate(&token, "fp1", NOW + DAY_MS),
            Err(AuthError::ExpiredSession)
        );
        assert_eq!(
            validator.validate(&token, "fp1", NOW + 2 * DAY_MS),
            Err(AuthError::ExpiredSession)
        );
    }

    #[test]
    fn test_removed_hash_revokes_session() {
        let codec = codec();
        let issuing_gate = gate_with(&["abc123", "other"]);
        let token = issue(&issuing_gate, &codec, "abc123", "fp1");

        let shrunk_gate = gate_with(&["other"]);
        assert_eq!(
            SessionValidator::new(&shrunk_gate, &codec).validate(&token, "fp1", NOW),
            Err(AuthError::Revoked)
        );
    }

    #[test]
    fn test_tampered_token_rejected() {
        let (gate, codec) = (gate_with(&["abc123"]), codec());
        let token = issue(&gate, &codec, "abc123", "fp1");
        let tampered = format!("{}x", token);

        assert_eq!(
            SessionValidator::new(&gate, &codec).validate(&tampered, "fp1", NOW),
            Err(AuthError::MalformedToken)
        );
    }

    #[test]
    fn test_check_order() {
        let codec = codec();
        let issuing_gate = gate_with(&["abc123", "other"]);
        let token = issue(&issuing_gate, &codec, "abc123", "fp1");
        let revoked_gate = gate_with(&["other"]);
        let validator = SessionValidator::new(&revoked_gate, &codec);

        // Expired, wrong device and revoked: expiry is reported first.
        assert_eq!(
            validator.validate(&token, "fp2", NOW + 2 * DAY_MS),
            Err(AuthError::ExpiredSession)
        );
        // Wrong device and revoked: device is reported before revocation.
        assert_eq!(
            validator.validate(&token, "fp2", NOW),
            Err(AuthError::DeviceMismatch)
        );
    }

    #[test]
    fn test_token_from_other_deployment_rejected() {
        let gate = gate_with(&["abc123"]);
        let foreign_codec = TokenCodec::new(b"someone-else").unwrap();
        let token = issue(&gate, &foreign_codec, "abc123", "fp1");

        assert_eq!(
            SessionValidator::new(&gate, &codec()).validate(&token, "fp1", NOW),
            Err(AuthError::MalformedToken)
        );
    }
}
