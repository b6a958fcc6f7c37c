//! Configuration management for AuthCoin.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCoinConfig {
    pub registry: RegistryConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Verifiers registered by the owner when the ledger is empty.
    #[serde(default)]
    pub verifiers: Vec<VerifierBinding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Account allowed to register signature verifiers.
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub path: PathBuf,
    pub node_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Binds a content-type label to a named signature scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierBinding {
    /// Content-type label, at most 32 bytes
    pub content_type: String,
    /// Built-in verifier name (`ed25519`, `p256`, `secp256k1`, `rsa`, `dummy`)
    pub scheme: String,
}

impl AuthCoinConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry.owner.trim().is_empty() {
            return Err(CoreError::Config("registry.owner must not be empty".into()));
        }
        if self.ledger.node_id.trim().is_empty() {
            return Err(CoreError::Config("ledger.node_id must not be empty".into()));
        }
        for binding in &self.verifiers {
            if binding.content_type.is_empty() || binding.content_type.len() > crate::types::ID_LEN
            {
                return Err(CoreError::Config(format!(
                    "verifier content_type '{}' must be 1..={} bytes",
                    binding.content_type,
                    crate::types::ID_LEN
                )));
            }
        }
        Ok(())
    }

    pub fn default_config() -> Self {
        Self {
            registry: RegistryConfig {
                owner: "owner".to_string(),
            },
            ledger: LedgerConfig {
                path: PathBuf::from("data/authcoin-ledger.db"),
                node_id: "node-001".to_string(),
            },
            logging: LoggingConfig::default(),
            verifiers: vec![
                VerifierBinding {
                    content_type: "ed25519".to_string(),
                    scheme: "ed25519".to_string(),
                },
                VerifierBinding {
                    content_type: "ec".to_string(),
                    scheme: "p256".to_string(),
                },
                VerifierBinding {
                    content_type: "secp256k1".to_string(),
                    scheme: "secp256k1".to_string(),
                },
                VerifierBinding {
                    content_type: "rsa".to_string(),
                    scheme: "rsa".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let config = AuthCoinConfig::from_toml_str(
            r#"
            [registry]
            owner = "alice"

            [ledger]
            path = "/tmp/authcoin.db"
            node_id = "node-7"

            [logging]
            json = true

            [[verifiers]]
            content_type = "dummy"
            scheme = "dummy"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.owner, "alice");
        assert_eq!(config.ledger.node_id, "node-7");
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.verifiers.len(), 1);
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/authcoin.toml");
        let config = AuthCoinConfig::from_file(path).unwrap();
        assert_eq!(config.verifiers, AuthCoinConfig::default_config().verifiers);
    }

    #[test]
    fn test_empty_owner_rejected() {
        let result = AuthCoinConfig::from_toml_str(
            r#"
            [registry]
            owner = ""

            [ledger]
            path = "x.db"
            node_id = "n"
            "#,
        );
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_oversized_content_type_rejected() {
        let mut config = AuthCoinConfig::default_config();
        config.verifiers.push(VerifierBinding {
            content_type: "z".repeat(40),
            scheme: "dummy".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AuthCoinConfig::default_config().validate().is_ok());
    }
}
