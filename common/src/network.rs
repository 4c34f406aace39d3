use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// Ledger network the client is pointed at. `Custom` covers private
// clusters reached through a user-supplied RPC endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Custom,
}

impl Network {
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::Mainnet)
    }
}
