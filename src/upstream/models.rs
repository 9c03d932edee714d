use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Load-balancing strategy applied by the pool core when picking a
/// credential for an upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalanceMode {
    /// Rotate through enabled credentials in order.
    RoundRobin,
    /// Prefer the credential with the lowest used/limit ratio.
    LeastUsed,
}

impl std::fmt::Display for LoadBalanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round_robin"),
            Self::LeastUsed => write!(f, "least_used"),
        }
    }
}

impl std::str::FromStr for LoadBalanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(Self::RoundRobin),
            "least_used" => Ok(Self::LeastUsed),
            other => Err(format!(
                "Unknown balancing mode '{other}': expected 'round_robin' or 'least_used'"
            )),
        }
    }
}

/// A credential record as owned and returned by the pool core.
///
/// The record never carries token material: `token_hash` is the SHA-256 hex
/// fingerprint the core computed at creation, and the dashboard only ever
/// compares fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub token_hash: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default)]
    pub created_at: String,
}

impl Credential {
    /// Short fingerprint prefix for display in listings.
    pub fn hash_prefix(&self) -> &str {
        let end = self.token_hash.len().min(12);
        &self.token_hash[..end]
    }
}

/// Remote usage/limit pair for a credential.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub used: f64,
    pub limit: f64,
}

impl Balance {
    pub fn remaining(&self) -> f64 {
        (self.limit - self.used).max(0.0)
    }

    /// Used fraction as a percentage, clamped to [0, 100]. A zero limit
    /// counts as fully used.
    pub fn percent_used(&self) -> f64 {
        if self.limit <= 0.0 {
            return 100.0;
        }
        (self.used / self.limit * 100.0).clamp(0.0, 100.0)
    }
}

/// Result of asking the pool core to verify a credential against Kiro.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for creating a credential.
#[derive(Clone, Serialize)]
pub struct CreateCredential {
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl std::fmt::Debug for CreateCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateCredential")
            .field("refresh_token", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// SHA-256 hex fingerprint of a refresh token, matching what the pool core
/// stores in [`Credential::token_hash`]. Whitespace is trimmed first so a
/// pasted token with a trailing newline fingerprints identically.
pub fn token_fingerprint(refresh_token: &str) -> String {
    let digest = Sha256::digest(refresh_token.trim().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mode_round_trips_serde() {
        let json = serde_json::to_string(&LoadBalanceMode::RoundRobin).unwrap();
        assert_eq!(json, r#""round_robin""#);
        let mode: LoadBalanceMode = serde_json::from_str(r#""least_used""#).unwrap();
        assert_eq!(mode, LoadBalanceMode::LeastUsed);
    }

    #[test]
    fn test_mode_from_str_rejects_unknown() {
        assert!(LoadBalanceMode::from_str("sticky").is_err());
        assert_eq!(
            LoadBalanceMode::from_str("round_robin").unwrap(),
            LoadBalanceMode::RoundRobin
        );
    }

    #[test]
    fn test_mode_display_matches_wire_form() {
        assert_eq!(LoadBalanceMode::LeastUsed.to_string(), "least_used");
    }

    #[test]
    fn test_balance_remaining_never_negative() {
        let b = Balance {
            used: 120.0,
            limit: 100.0,
        };
        assert_eq!(b.remaining(), 0.0);
    }

    #[test]
    fn test_balance_percent_used() {
        let b = Balance {
            used: 25.0,
            limit: 100.0,
        };
        assert_eq!(b.percent_used(), 25.0);

        let zero_limit = Balance {
            used: 0.0,
            limit: 0.0,
        };
        assert_eq!(zero_limit.percent_used(), 100.0);
    }

    #[test]
    fn test_fingerprint_trims_whitespace() {
        assert_eq!(token_fingerprint("tok-abc"), token_fingerprint(" tok-abc\n"));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = token_fingerprint("tok-abc");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_prefix_handles_short_hashes() {
        let cred = Credential {
            id: "c1".into(),
            email: None,
            token_hash: "abc".into(),
            disabled: false,
            failure_count: 0,
            created_at: String::new(),
        };
        assert_eq!(cred.hash_prefix(), "abc");
    }

    #[test]
    fn test_credential_deserializes_with_defaults() {
        let json = r#"{"id": "c1", "token_hash": "aa"}"#;
        let cred: Credential = serde_json::from_str(json).unwrap();
        assert!(!cred.disabled);
        assert_eq!(cred.failure_count, 0);
        assert!(cred.email.is_none());
    }

    #[test]
    fn test_create_credential_debug_redacts_token() {
        let req = CreateCredential {
            refresh_token: "super-secret".into(),
            email: Some("a@b.c".into()),
        };
        let debug = format!("{req:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
