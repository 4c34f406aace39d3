use candymint_common::{
    crypto::Address,
    machine::MachineSnapshot,
    serializer::Serializer,
};
use log::{debug, trace};

use crate::{error::ClientError, rpc_gateway::SharedLedgerRpc};

/// Read path shared by the refresh scheduler and the mint pipeline:
/// one account read, strict decode, no side effects. The address was
/// validated when the settings were loaded, so a malformed identifier
/// can never reach the network from here.
pub struct MachineReader {
    ledger: SharedLedgerRpc,
    machine_address: Address,
}

impl MachineReader {
    pub fn new(ledger: SharedLedgerRpc, machine_address: Address) -> Self {
        Self {
            ledger,
            machine_address,
        }
    }

    pub fn address(&self) -> &Address {
        &self.machine_address
    }

    pub async fn fetch(&self) -> Result<MachineSnapshot, ClientError> {
        trace!("fetch machine state");

        let data = self.ledger.read_account(&self.machine_address).await?;
        // a layout mismatch is surfaced to the caller, never retried silently
        let snapshot = MachineSnapshot::from_bytes(&data)?;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Machine {}: {}/{} redeemed",
                self.machine_address, snapshot.items_redeemed, snapshot.items_available
            );
        }

        Ok(snapshot)
    }
}
