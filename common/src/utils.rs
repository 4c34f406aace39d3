use crate::config::{COIN_DECIMALS, COIN_VALUE};

// Format an amount of lamports in the display denomination,
// trimming trailing zeros ("1.5" rather than "1.500000000")
pub fn format_coin(lamports: u64) -> String {
    let whole = lamports / COIN_VALUE;
    let fraction = lamports % COIN_VALUE;
    if fraction == 0 {
        return whole.to_string();
    }

    let mut fraction = format!("{:0width$}", fraction, width = COIN_DECIMALS as usize);
    while fraction.ends_with('0') {
        fraction.pop();
    }
    format!("{}.{}", whole, fraction)
}

// Ensure the RPC endpoint has a scheme and no trailing slash so
// path concatenation stays predictable
pub fn sanitize_rpc_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
