use candymint_common::{
    config::COIN_TICKER,
    machine::MachineSnapshot,
    utils::format_coin,
};

use crate::error::ClientError;

// Effective price in lamports for the connected user. A whitelist
// discount, when present, replaces the list price. Pure and
// deterministic so it can run on every render.
pub fn resolve_price_lamports(snapshot: &MachineSnapshot) -> Result<u64, ClientError> {
    let effective = match snapshot
        .whitelist
        .as_ref()
        .and_then(|whitelist| whitelist.discount_price)
    {
        Some(discount) => {
            i64::try_from(discount).map_err(|_| ClientError::InvalidState("discount price overflow"))?
        }
        None => snapshot.price_lamports,
    };

    if effective < 0 {
        return Err(ClientError::InvalidState("negative price"));
    }

    Ok(effective as u64)
}

// Display form, e.g. "1.5 SOL"
pub fn display_price(snapshot: &MachineSnapshot) -> Result<String, ClientError> {
    let lamports = resolve_price_lamports(snapshot)?;
    Ok(format!("{} {}", format_coin(lamports), COIN_TICKER))
}
