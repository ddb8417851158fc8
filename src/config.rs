use std::env;
use std::net::SocketAddr;
use zeroize::Zeroizing;

/// Server settings. Independent of the auth secrets so that a missing secret
/// never prevents the process from answering with 503.
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_addr: SocketAddr,
    pub allowed_origin: Option<String>,

    // Limits
    pub max_body_bytes: usize,

    // TTLs (in seconds)
    pub session_ttl_secs: u64,
}

/// Secrets and allow-list consumed by the hash gate and token codec.
#[derive(Clone)]
pub struct AuthConfig {
    pub salt: Zeroizing<String>,
    pub signing_secret: Zeroizing<String>,
    pub allowed_hashes: Vec<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("salt", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .field("allowed_hashes", &self.allowed_hashes.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load server settings from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        let _ = dotenvy::dotenv();

        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;

        let allowed_origin = env::var("ALLOWED_ORIGIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 16_384)?;

        let session_ttl_secs: u64 = parse_env_or_default("SESSION_TTL_SECS", 86_400)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            bind_addr,
            allowed_origin,
            max_body_bytes,
            session_ttl_secs,
        })
    }
}

impl AuthConfig {
    /// Load the salt, signing secret and allow-list.
    ///
    /// Every value is required and must be non-empty. The caller treats an
    /// error here as "auth unavailable" rather than a startup failure.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let salt = Zeroizing::new(required_var("SECURE_SALT")?);
        let signing_secret = Zeroizing::new(required_var("JWT_SECRET")?);
        let allowed_hashes = parse_allowed_hashes(&required_var("ALLOWED_HASHES")?)?;

        Ok(AuthConfig {
            salt,
            signing_secret,
            allowed_hashes,
        })
    }
}

fn required_var(key: &str) -> Result<String, ConfigError> {
    let val = env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))?;
    if val.trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "cannot be empty".to_string(),
        ));
    }
    Ok(val)
}

/// Parse `ALLOWED_HASHES`, either a JSON array of strings or a comma list.
///
/// Entries are trimmed, lowercased and de-duplicated keeping first occurrence.
pub fn parse_allowed_hashes(raw: &str) -> Result<Vec<String>, ConfigError> {
    let raw = raw.trim();
    let entries: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw)
            .map_err(|e| ConfigError::ParseError("ALLOWED_HASHES".to_string(), e.to_string()))?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    let mut hashes: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let hash = entry.trim().to_ascii_lowercase();
        if hash.is_empty() {
            continue;
        }
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidValue(
                "ALLOWED_HASHES".to_string(),
                "entries must be 64-character hex SHA-256 digests".to_string(),
            ));
        }
        if !hashes.contains(&hash) {
            hashes.push(hash);
        }
    }

    if hashes.is_empty() {
        return Err(ConfigError::InvalidValue(
            "ALLOWED_HASHES".to_string(),
            "cannot be empty".to_string(),
        ));
    }
    Ok(hashes)
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
