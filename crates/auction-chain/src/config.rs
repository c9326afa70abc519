use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;

use auction_core::NATIVE_TOKEN_ID;

/// Serde adapter for u128 ↔ TOML: serialize as string, deserialize from string or integer.
/// TOML crate doesn't natively support u128, so we round-trip through strings.
mod u128_toml {
    use super::*;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        use serde::de::{self, Visitor};
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

/// Genesis settings for one simulated chain instance.
/// Allows each test network to declare its own funded accounts and clock.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Token id of the native currency (defaults to the mainnet id)
    pub native_token_id: String,
    /// Chain clock at genesis, epoch milliseconds
    pub genesis_time_ms: u64,
    /// Accounts funded with native currency at genesis
    #[serde(default)]
    pub genesis_accounts: Vec<GenesisAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: String,
    #[serde(with = "u128_toml")]
    pub balance: u128,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            native_token_id: NATIVE_TOKEN_ID.to_string(),
            genesis_time_ms: 1_700_000_000_000,
            genesis_accounts: Vec::new(),
        }
    }
}

impl ChainConfig {
    /// Load chain config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: ChainConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.native_token_id.is_empty() {
            return Err("Config Error: native_token_id is empty".to_string());
        }
        if self.genesis_time_ms == 0 {
            return Err("Config Error: genesis_time_ms must be > 0".to_string());
        }
        let mut seen = std::collections::BTreeSet::new();
        for account in &self.genesis_accounts {
            if account.address.is_empty() {
                return Err("Config Error: genesis account address is empty".to_string());
            }
            if !seen.insert(&account.address) {
                return Err(format!(
                    "Config Error: duplicate genesis account {}",
                    account.address
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validates() {
        assert!(ChainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
native_token_id = "tti_5649544520544f4b454e6e40"
genesis_time_ms = 1700000000000

[[genesis_accounts]]
address = "acc_deployer"
balance = "10000000000000000000000"

[[genesis_accounts]]
address = "acc_alice"
balance = 500
"#
        )
        .unwrap();

        let config = ChainConfig::load_from_file(&path).unwrap();
        assert_eq!(config.genesis_accounts.len(), 2);
        assert_eq!(
            config.genesis_accounts[0].balance,
            10_000_000_000_000_000_000_000
        );
        assert_eq!(config.genesis_accounts[1].balance, 500);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.toml");
        fs::write(&path, "native_token_id = [not toml").unwrap();
        assert!(ChainConfig::load_from_file(&path).is_err());
    }

    #[test]
    fn test_validate_duplicate_account() {
        let config = ChainConfig {
            genesis_accounts: vec![
                GenesisAccount {
                    address: "acc_a".to_string(),
                    balance: 1,
                },
                GenesisAccount {
                    address: "acc_a".to_string(),
                    balance: 2,
                },
            ],
            ..ChainConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ChainConfig {
            genesis_accounts: vec![GenesisAccount {
                address: "acc_a".to_string(),
                balance: u128::MAX,
            }],
            ..ChainConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let back: ChainConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.genesis_accounts[0].balance, u128::MAX);
    }
}
