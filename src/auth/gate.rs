//! Salted key hashing and allow-list membership.

use crate::config::ConfigError;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Hex-encoded `sha256(salt || key)`. The unit of identity and revocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHash(String);

impl KeyHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for KeyHash {
    fn from(hash: String) -> Self {
        Self(hash.to_ascii_lowercase())
    }
}

/// Derive the key hash for a candidate secret key.
pub fn compute_key_hash(secret_key: &str, salt: &str) -> KeyHash {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret_key.as_bytes());
    KeyHash(hex::encode(hasher.finalize()))
}

/// Ordered set of key hashes granted access.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    hashes: Vec<String>,
}

impl AllowList {
    /// Build from raw hex strings, lowercasing and dropping duplicates.
    pub fn new<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for hash in hashes {
            let hash = hash.into().trim().to_ascii_lowercase();
            if !hash.is_empty() && !list.contains(&hash) {
                list.push(hash);
            }
        }
        Self { hashes: list }
    }

    /// Membership test. Every entry is compared so the time taken does not
    /// depend on where (or whether) the hash matches.
    pub fn contains(&self, hash: &KeyHash) -> bool {
        let candidate = hash.as_str().as_bytes();
        let mut found = false;
        for entry in &self.hashes {
            found |= bool::from(entry.as_bytes().ct_eq(candidate));
        }
        found
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hashes.iter().map(String::as_str)
    }
}

/// Salt plus allow-list. Cannot be constructed unconfigured.
pub struct HashGate {
    salt: Zeroizing<String>,
    allow_list: AllowList,
}

impl HashGate {
    pub fn new(salt: &str, allow_list: AllowList) -> Result<Self, ConfigError> {
        if salt.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SECURE_SALT".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        if allow_list.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ALLOWED_HASHES".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            salt: Zeroizing::new(salt.to_string()),
            allow_list,
        })
    }

    pub fn hash(&self, secret_key: &str) -> KeyHash {
        compute_key_hash(secret_key, &self.salt)
    }

    pub fn is_authorized(&self, hash: &KeyHash) -> bool {
        self.allow_list.contains(hash)
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_hash_matches_sha256_of_salt_then_key() {
        // sha256("sabc123")
        let expected = hex::encode(Sha256::digest(b"sabc123"));
        assert_eq!(compute_key_hash("abc123", "s").as_str(), expected);
        assert_eq!(compute_key_hash("abc123", "s").as_str().len(), 64);
    }

    #[test]
    fn test_key_hash_is_deterministic() {
        assert_eq!(
            compute_key_hash("abc123", "salt"),
            compute_key_hash("abc123", "salt")
        );
    }

    #[test]
    fn test_distinct_keys_distinct_hashes() {
        let keys = ["abc123", "abc124", "ABC123", "", " abc123", "abc123 "];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(compute_key_hash(a, "s"), compute_key_hash(b, "s"));
            }
        }
    }

    #[test]
    fn test_salt_changes_hash() {
        assert_ne!(
            compute_key_hash("abc123", "s1"),
            compute_key_hash("abc123", "s2")
        );
    }

    #[test]
    fn test_allow_list_membership() {
        let member = compute_key_hash("abc123", "s");
        let stranger = compute_key_hash("wrong", "s");
        let list = AllowList::new([member.to_string()]);

        assert!(list.contains(&member));
        assert!(!list.contains(&stranger));
    }

    #[test]
    fn test_allow_list_normalizes_and_dedups() {
        let hash = compute_key_hash("abc123", "s");
        let list = AllowList::new([
            hash.as_str().to_uppercase(),
            format!("  {}  ", hash),
            String::new(),
        ]);
        assert_eq!(list.len(), 1);
        assert!(list.contains(&hash));
    }

    #[test]
    fn test_gate_refuses_empty_salt() {
        let list = AllowList::new([compute_key_hash("k", "s").to_string()]);
        assert!(matches!(
            HashGate::new("", list),
            Err(ConfigError::InvalidValue(ref s, _)) if s == "SECURE_SALT"
        ));
    }

    #[test]
    fn test_gate_refuses_empty_allow_list() {
        assert!(matches!(
            HashGate::new("s", AllowList::default()),
            Err(ConfigError::InvalidValue(ref s, _)) if s == "ALLOWED_HASHES"
        ));
    }

    #[test]
    fn test_gate_hash_and_authorize() {
        let gate = HashGate::new(
            "s",
            AllowList::new([compute_key_hash("abc123", "s").to_string()]),
        )
        .unwrap();
        assert!(gate.is_authorized(&gate.hash("abc123")));
        assert!(!gate.is_authorized(&gate.hash("wrong")));
    }
}
