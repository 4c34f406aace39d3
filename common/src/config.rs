pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 9 decimals numbers
pub const COIN_DECIMALS: u8 = 9;
// 1 000 000 000 lamports to represent 1 coin
pub const COIN_VALUE: u64 = 10u64.pow(COIN_DECIMALS as u32);
// Ticker used when displaying prices
pub const COIN_TICKER: &str = "SOL";

// Interval in seconds between two machine state refreshes
pub const DEFAULT_REFRESH_INTERVAL: u64 = 20;
// How long we wait for a submitted transaction to be confirmed
// before the attempt is reported as unconfirmed (in milliseconds)
pub const DEFAULT_CONFIRMATION_TIMEOUT: u64 = 500_000;
// Per-request timeout against the RPC endpoint (in milliseconds)
pub const DEFAULT_RPC_TIMEOUT: u64 = 30_000;
// Delay between two confirmation status polls (in milliseconds)
pub const CONFIRMATION_POLL_INTERVAL: u64 = 2_000;
