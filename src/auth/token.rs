//! Session token encoding and authentication.
//!
//! Format: `base64url(claims_json) "." base64url(hmac_sha256(secret, claims_json))`.
//! Claims are signed, not encrypted.

use super::AuthError;
use crate::config::ConfigError;
use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// URL-safe alphabet that accepts padded and unpadded input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Payload bound into a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "hash")]
    pub key_hash: String,
    #[serde(rename = "fp")]
    pub fingerprint: String,
    /// Absolute expiry, milliseconds since the Unix epoch.
    #[serde(rename = "exp")]
    pub expiry: i64,
}

/// Signs and authenticates session tokens with a server-only secret.
pub struct TokenCodec {
    secret: Zeroizing<Vec<u8>>,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
        })
    }

    fn mac(&self) -> HmacSha256 {
        <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .expect("HMAC can accept any key length")
    }

    pub fn encode(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|_| AuthError::MalformedToken)?;

        let mut mac = self.mac();
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(&payload),
            general_purpose::URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    /// Authenticate and parse a token.
    ///
    /// Structure, tag and payload failures all collapse to
    /// [`AuthError::MalformedToken`].
    pub fn decode(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        if payload_b64.is_empty() || tag_b64.is_empty() || tag_b64.contains('.') {
            return Err(AuthError::MalformedToken);
        }

        let payload = URL_SAFE_LENIENT
            .decode(payload_b64)
            .map_err(|_| AuthError::MalformedToken)?;
        let tag = URL_SAFE_LENIENT
            .decode(tag_b64)
            .map_err(|_| AuthError::MalformedToken)?;

        let mut mac = self.mac();
        mac.update(&payload);
        mac.verify_slice(&tag).map_err(|_| AuthError::MalformedToken)?;

        serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)
    }
}
