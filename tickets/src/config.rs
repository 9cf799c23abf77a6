//! Configuration management.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use crate::purchase::PurchaseSettings;
use crate::share::Explorer;
use crate::types::{Address, Lamports};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default crypto payment destination (the system program address).
pub const DEFAULT_DESTINATION: &str = "11111111111111111111111111111111";
/// Default simulated card processing time.
pub const DEFAULT_CARD_DELAY_MS: u64 = 2000;
/// Default block explorer.
pub const DEFAULT_EXPLORER_URL: &str = "https://explorer.solana.com";
/// Default cluster.
pub const DEFAULT_CLUSTER: &str = "devnet";
/// Default network label on ticket cards.
pub const DEFAULT_NETWORK_LABEL: &str = "Solana Devnet";
/// Default demo wallet funding, in SOL.
pub const DEFAULT_DEMO_AIRDROP_SOL: f64 = 2.0;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where crypto payments are sent (`REELMINT_DESTINATION`)
    pub destination: Address,
    /// Simulated card processing time in milliseconds (`REELMINT_CARD_DELAY_MS`)
    pub card_delay_ms: u64,
    /// Explorer links (`REELMINT_EXPLORER_URL`, `REELMINT_CLUSTER`)
    pub explorer: Explorer,
    /// Network label on ticket cards (`REELMINT_NETWORK_LABEL`)
    pub network_label: String,
    /// JSON catalog feed; built-in catalog when unset (`REELMINT_CATALOG_PATH`)
    pub catalog_path: Option<PathBuf>,
    /// Funding for demo wallets (`REELMINT_DEMO_AIRDROP_SOL`)
    pub demo_airdrop: Lamports,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: Address::new(DEFAULT_DESTINATION),
            card_delay_ms: DEFAULT_CARD_DELAY_MS,
            explorer: Explorer::default(),
            network_label: DEFAULT_NETWORK_LABEL.to_string(),
            catalog_path: None,
            demo_airdrop: Lamports::from_sol(DEFAULT_DEMO_AIRDROP_SOL).unwrap_or_default(),
        }
    }
}

fn parse_card_delay(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

fn parse_airdrop(value: &str) -> Option<Lamports> {
    value.trim().parse::<f64>().ok().and_then(Lamports::from_sol)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables take their defaults. Unparseable numbers also fall
    /// back to their defaults, with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from environment variables, rejecting unparseable
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad variable.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::try_from_lookup(|key| std::env::var(key).ok())
    }

    /// Lenient load from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::base(&lookup);

        if let Some(raw) = lookup("REELMINT_CARD_DELAY_MS") {
            match parse_card_delay(&raw) {
                Some(ms) => config.card_delay_ms = ms,
                None => tracing::warn!(value = %raw, "Invalid REELMINT_CARD_DELAY_MS, using default"),
            }
        }
        if let Some(raw) = lookup("REELMINT_DEMO_AIRDROP_SOL") {
            match parse_airdrop(&raw) {
                Some(amount) => config.demo_airdrop = amount,
                None => tracing::warn!(value = %raw, "Invalid REELMINT_DEMO_AIRDROP_SOL, using default"),
            }
        }
        config
    }

    /// Strict load from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad variable.
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::base(&lookup);

        if let Some(raw) = lookup("REELMINT_CARD_DELAY_MS") {
            config.card_delay_ms = parse_card_delay(&raw).ok_or(ConfigError::Invalid {
                key: "REELMINT_CARD_DELAY_MS",
                value: raw,
            })?;
        }
        if let Some(raw) = lookup("REELMINT_DEMO_AIRDROP_SOL") {
            config.demo_airdrop = parse_airdrop(&raw).ok_or(ConfigError::Invalid {
                key: "REELMINT_DEMO_AIRDROP_SOL",
                value: raw,
            })?;
        }
        Ok(config)
    }

    /// String-valued settings, which cannot fail to parse.
    fn base(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            destination: lookup("REELMINT_DESTINATION").map_or(defaults.destination, Address::new),
            explorer: Explorer {
                base_url: lookup("REELMINT_EXPLORER_URL").unwrap_or(defaults.explorer.base_url),
                cluster: lookup("REELMINT_CLUSTER").unwrap_or(defaults.explorer.cluster),
            },
            network_label: lookup("REELMINT_NETWORK_LABEL").unwrap_or(defaults.network_label),
            catalog_path: lookup("REELMINT_CATALOG_PATH").map(PathBuf::from),
            ..defaults
        }
    }

    /// Settings for the purchase environment.
    #[must_use]
    pub fn purchase_settings(&self) -> PurchaseSettings {
        PurchaseSettings {
            destination: self.destination.clone(),
            card_processing_delay: Duration::from_millis(self.card_delay_ms),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.destination.as_str(), DEFAULT_DESTINATION);
        assert_eq!(
            config.purchase_settings().card_processing_delay,
            Duration::from_millis(2000)
        );
        assert_eq!(config.demo_airdrop, Lamports::new(2_000_000_000));
        assert_eq!(config.catalog_path, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_from_lookup(lookup(&[
            ("REELMINT_DESTINATION", "TheaterVault111"),
            ("REELMINT_CARD_DELAY_MS", "50"),
            ("REELMINT_CLUSTER", "testnet"),
            ("REELMINT_CATALOG_PATH", "/etc/reelmint/catalog.json"),
            ("REELMINT_DEMO_AIRDROP_SOL", "0.25"),
        ]))
        .unwrap();

        assert_eq!(config.destination, Address::from("TheaterVault111"));
        assert_eq!(config.card_delay_ms, 50);
        assert_eq!(config.explorer.cluster, "testnet");
        assert_eq!(config.explorer.base_url, DEFAULT_EXPLORER_URL);
        assert_eq!(config.catalog_path, Some(PathBuf::from("/etc/reelmint/catalog.json")));
        assert_eq!(config.demo_airdrop, Lamports::new(250_000_000));
    }

    #[test]
    fn test_invalid_numbers() {
        let vars = [("REELMINT_CARD_DELAY_MS", "soon")];

        assert_eq!(Config::from_lookup(lookup(&vars)).card_delay_ms, DEFAULT_CARD_DELAY_MS);
        assert_eq!(
            Config::try_from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Invalid {
                key: "REELMINT_CARD_DELAY_MS",
                value: "soon".to_string()
            }
        );

        let vars = [("REELMINT_DEMO_AIRDROP_SOL", "-1")];
        assert!(Config::try_from_lookup(lookup(&vars)).is_err());
    }
}
