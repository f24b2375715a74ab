// crates/laurel-daemon/src/config.rs
//
// Runtime configuration for the Laurel staking daemon.
// Loaded from a TOML file or populated with sensible defaults.

use std::collections::BTreeMap;
use std::fs;

use serde::Deserialize;

use laurel_staking::StakingConfig;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Ledger backend: "rocks" or "memory".
    #[serde(default = "default_store")]
    pub store: String,

    /// Accrual rate and commit retry policy.
    #[serde(default)]
    pub staking: StakingConfig,

    /// Ownership verification.
    #[serde(default)]
    pub ownership: OwnershipConfig,
}

/// `[ownership]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnershipConfig {
    /// Base URL of the ownership service. When unset, the daemon answers
    /// ownership queries from `dev_owners`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Per-request timeout for the ownership service.
    #[serde(default = "default_ownership_timeout_ms")]
    pub timeout_ms: u64,

    /// Token id -> owner id, for development without an ownership service.
    #[serde(default)]
    pub dev_owners: BTreeMap<String, String>,
}

fn default_data_dir() -> String {
    "~/.laurel/data".to_string()
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50071
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store() -> String {
    "rocks".to_string()
}

fn default_ownership_timeout_ms() -> u64 {
    5_000
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_ownership_timeout_ms(),
            dev_owners: BTreeMap::new(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            store: default_store(),
            staking: StakingConfig::default(),
            ownership: OwnershipConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Check values that serde defaults cannot.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self.store.as_str() {
            "rocks" | "memory" => {}
            other => return Err(format!("unknown store backend '{}'", other).into()),
        }
        if self.ownership.timeout_ms == 0 {
            return Err("ownership.timeout_ms must be positive".into());
        }
        self.staking.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let cfg = DaemonConfig::parse("").unwrap();
        assert_eq!(cfg.rpc_port, 50071);
        assert_eq!(cfg.store, "rocks");
        assert_eq!(cfg.staking, StakingConfig::default());
        assert!(cfg.ownership.endpoint.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_nested_tables() {
        let cfg = DaemonConfig::parse(
            r#"
            store = "memory"

            [staking]
            rate_per_day = 7
            one_day_secs = 60

            [ownership]
            timeout_ms = 250

            [ownership.dev_owners]
            "1" = "0xalice"
            "2" = "0xbob"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.store, "memory");
        assert_eq!(cfg.staking.rate_per_day, 7);
        assert_eq!(cfg.staking.one_day_secs, 60);
        assert_eq!(cfg.staking.max_commit_attempts, 5);
        assert_eq!(cfg.ownership.timeout_ms, 250);
        assert_eq!(cfg.ownership.dev_owners.get("2").map(String::as_str), Some("0xbob"));
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let cfg = DaemonConfig {
            store: "postgres".to_string(),
            ..DaemonConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let cfg = DaemonConfig::parse("[staking]\nrate_per_day = 0\n").unwrap();
        assert!(cfg.validate().is_err());
    }
}
