//! Process configuration: a JSON file layered over environment variables
//! and hardcoded defaults, loaded once at startup.

use std::fs;
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// CLI arguments accepted by the binary.
#[derive(Parser, Debug)]
#[command(name = "multichain-custody")]
#[command(about = "Multi-chain custodial wallet transfer and monitoring engine")]
pub struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,
}

/// A value that deserializes either as a literal or as an env-var reference
/// (`$VAR` / `${VAR}`), resolved at load time.
///
/// Lets a secret like `evm.funding.privateKey` live in source control as a
/// `${EVM_FUNDING_KEY}` placeholder while the real value stays in the
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(pub T);

impl<T> LiteralOrEnv<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    fn parse_env_var_syntax(s: &str) -> Option<String> {
        if let Some(inner) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            Some(inner.to_string())
        } else if let Some(name) = s.strip_prefix('$') {
            if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                Some(name.to_string())
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let resolved = if let Some(var_name) = Self::parse_env_var_syntax(&raw) {
            std::env::var(&var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "environment variable '{var_name}' referenced as '{raw}' was not found"
                ))
            })?
        } else {
            raw
        };
        resolved
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("failed to parse value: {e}")))
    }
}

fn default_monitor_period_secs() -> u64 {
    30
}
fn default_monitor_initial_delay_secs() -> u64 {
    10
}
fn default_monitor_max_age_hours() -> u64 {
    24
}
fn default_evm_confirmations() -> u64 {
    3
}
fn default_initial_eth() -> String {
    "10".to_string()
}
fn default_initial_xrp() -> String {
    "100".to_string()
}
fn default_initial_sol() -> String {
    "1".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvmConfig {
    pub rpc_url: Url,
    pub chain_id: u64,
    /// Absent ⇒ ETH funding is skipped, not an error.
    pub funding_private_key: Option<LiteralOrEnv<String>>,
    #[serde(default = "default_initial_eth")]
    pub funding_initial_eth: String,
    pub token_usdc_address: String,
    pub token_eurc_address: String,
    pub token_test_usdc_address: String,
    pub token_test_eurc_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XrpConfig {
    pub rpc_url: String,
    pub faucet_url: Url,
    pub funding_secret: Option<LiteralOrEnv<String>>,
    #[serde(default = "default_initial_xrp")]
    pub funding_initial_xrp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolConfig {
    pub rpc_url: String,
    #[serde(default = "default_initial_sol")]
    pub funding_initial_sol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_monitor_period_secs")]
    pub period_secs: u64,
    #[serde(default = "default_monitor_initial_delay_secs")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_monitor_max_age_hours")]
    pub max_age_hours: u64,
    #[serde(default = "default_evm_confirmations")]
    pub evm_confirmations: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period_secs: default_monitor_period_secs(),
            initial_delay_secs: default_monitor_initial_delay_secs(),
            max_age_hours: default_monitor_max_age_hours(),
            evm_confirmations: default_evm_confirmations(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub evm: EvmConfig,
    pub xrp: XrpConfig,
    pub sol: SolConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Config {
    /// Loads configuration from `path`, falling back to `dotenvy`-populated
    /// environment variables for `${VAR}`-style fields.
    pub fn load(path: &PathBuf) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Invalid {
            key: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::Invalid {
            key: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn load_from_cli() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::load(&args.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_or_env_resolves_env_var_reference() {
        unsafe {
            std::env::set_var("MULTICHAIN_TEST_KEY", "resolved-value");
        }
        let json = r#""${MULTICHAIN_TEST_KEY}""#;
        let parsed: LiteralOrEnv<String> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_inner(), "resolved-value");
    }

    #[test]
    fn literal_or_env_passes_through_literal() {
        let json = r#""0xcafe""#;
        let parsed: LiteralOrEnv<String> = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.into_inner(), "0xcafe");
    }

    #[test]
    fn missing_env_var_is_a_deserialize_error() {
        let json = r#""${MULTICHAIN_DEFINITELY_UNSET_VAR}""#;
        let result: Result<LiteralOrEnv<String>, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
