use std::{str::FromStr, time::Duration};

use candymint_common::{
    config::{DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_REFRESH_INTERVAL, DEFAULT_RPC_TIMEOUT},
    crypto::{Address, CryptoError},
    network::Network,
    utils::sanitize_rpc_url,
};
use thiserror::Error;

// Raw configuration as collected from flags and environment.
// Nothing here is trusted until `Settings::load` has validated it.
#[derive(Debug, Clone, clap::Args)]
pub struct MintConfig {
    /// Address of the candy machine account to mint from
    #[clap(long, env = "CANDYMINT_MACHINE_ADDRESS")]
    pub machine_address: Option<String>,
    /// Ledger network the RPC endpoint belongs to
    #[clap(long, value_enum, env = "CANDYMINT_NETWORK")]
    pub network: Option<Network>,
    /// RPC endpoint URL
    #[clap(long, env = "CANDYMINT_RPC_URL")]
    pub rpc_url: Option<String>,
    /// Transaction confirmation timeout in milliseconds
    #[clap(long, env = "CANDYMINT_CONFIRMATION_TIMEOUT", default_value_t = DEFAULT_CONFIRMATION_TIMEOUT)]
    pub confirmation_timeout: u64,
    /// Machine state refresh interval in seconds
    #[clap(long, env = "CANDYMINT_REFRESH_INTERVAL", default_value_t = DEFAULT_REFRESH_INTERVAL)]
    pub refresh_interval: u64,
    /// Per-request RPC timeout in milliseconds
    #[clap(long, default_value_t = DEFAULT_RPC_TIMEOUT)]
    pub rpc_timeout: u64,
}

impl MintConfig {
    // flag-level defaults, mirrored here for direct construction in tests
    pub fn defaults() -> Self {
        Self {
            machine_address: None,
            network: None,
            rpc_url: None,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing candy machine address (--machine-address or CANDYMINT_MACHINE_ADDRESS)")]
    MissingMachineAddress,
    #[error("Missing ledger network (--network or CANDYMINT_NETWORK)")]
    MissingNetwork,
    #[error("Missing RPC endpoint (--rpc-url or CANDYMINT_RPC_URL)")]
    MissingRpcUrl,
    #[error("Invalid candy machine address: {0}")]
    InvalidMachineAddress(CryptoError),
    #[error("Confirmation timeout must be greater than zero")]
    InvalidConfirmationTimeout,
    #[error("Refresh interval must be greater than zero")]
    InvalidRefreshInterval,
}

/// Validated startup configuration. Constructing one is the only way
/// to get the client going: every failure mode is a value returned
/// from [`Settings::load`], and no network-facing component exists
/// before it succeeds.
#[derive(Debug, Clone)]
pub struct Settings {
    pub machine_address: Address,
    pub network: Network,
    pub rpc_url: String,
    pub confirmation_timeout: Duration,
    pub refresh_interval: Duration,
    pub rpc_timeout: Duration,
}

impl Settings {
    pub fn load(config: &MintConfig) -> Result<Self, ConfigError> {
        let machine_address = config
            .machine_address
            .as_deref()
            .ok_or(ConfigError::MissingMachineAddress)?;
        let machine_address =
            Address::from_str(machine_address).map_err(ConfigError::InvalidMachineAddress)?;

        let network = config.network.ok_or(ConfigError::MissingNetwork)?;

        let rpc_url = config
            .rpc_url
            .as_deref()
            .ok_or(ConfigError::MissingRpcUrl)?;

        if config.confirmation_timeout == 0 {
            return Err(ConfigError::InvalidConfirmationTimeout);
        }
        if config.refresh_interval == 0 {
            return Err(ConfigError::InvalidRefreshInterval);
        }

        Ok(Self {
            machine_address,
            network,
            rpc_url: sanitize_rpc_url(rpc_url),
            confirmation_timeout: Duration::from_millis(config.confirmation_timeout),
            refresh_interval: Duration::from_secs(config.refresh_interval),
            rpc_timeout: Duration::from_millis(config.rpc_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candymint_common::crypto::KEY_SIZE;

    fn valid_config() -> MintConfig {
        MintConfig {
            machine_address: Some(Address::new([1u8; KEY_SIZE]).to_string()),
            network: Some(Network::Devnet),
            rpc_url: Some("https://api.devnet.example.com/".to_string()),
            ..MintConfig::defaults()
        }
    }

    #[test]
    fn test_load_valid() {
        let settings = Settings::load(&valid_config()).unwrap();
        assert_eq!(settings.network, Network::Devnet);
        assert_eq!(settings.rpc_url, "https://api.devnet.example.com");
        assert_eq!(settings.refresh_interval, Duration::from_secs(20));
    }

    // startup must fail before any gateway or wallet session exists
    #[test]
    fn test_missing_machine_address_is_fatal() {
        let mut config = valid_config();
        config.machine_address = None;
        assert!(matches!(
            Settings::load(&config),
            Err(ConfigError::MissingMachineAddress)
        ));
    }

    #[test]
    fn test_missing_network_is_fatal() {
        let mut config = valid_config();
        config.network = None;
        assert!(matches!(
            Settings::load(&config),
            Err(ConfigError::MissingNetwork)
        ));
    }

    #[test]
    fn test_missing_rpc_url_is_fatal() {
        let mut config = valid_config();
        config.rpc_url = None;
        assert!(matches!(
            Settings::load(&config),
            Err(ConfigError::MissingRpcUrl)
        ));
    }

    #[test]
    fn test_malformed_address_is_fatal() {
        let mut config = valid_config();
        config.machine_address = Some("not-a-base58-address!".to_string());
        assert!(matches!(
            Settings::load(&config),
            Err(ConfigError::InvalidMachineAddress(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.confirmation_timeout = 0;
        assert!(matches!(
            Settings::load(&config),
            Err(ConfigError::InvalidConfirmationTimeout)
        ));
    }
}
