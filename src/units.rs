//! Conversion between display ETH amounts and wei.

use alloy::primitives::U256;
use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const ETH_DECIMALS: u32 = 18;
pub const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

/// Converts an ETH amount to wei, truncating anything below one wei.
///
/// Negative amounts have no wei value and convert to zero. Tool inputs never
/// reach this with either: `AmountInput` rejects non-positive amounts and
/// amounts under one wei before any transaction is built.
///
/// The whole and fractional parts are scaled separately so the multiply stays
/// inside `Decimal` for any representable amount. Both conversions below are
/// then infallible: the fraction is under 10^18 wei and `Decimal::MAX` is
/// under `u128::MAX`.
pub fn to_base_units(amount: Decimal) -> U256 {
    if amount.is_sign_negative() {
        return U256::ZERO;
    }

    let whole = amount.trunc();
    let fraction = amount - whole;
    let fraction_wei = (fraction * Decimal::from(WEI_PER_ETH))
        .trunc()
        .to_u64()
        .unwrap_or_default();
    let whole_eth = whole.to_u128().unwrap_or_default();

    U256::from(whole_eth) * U256::from(WEI_PER_ETH) + U256::from(fraction_wei)
}

/// Formats a wei amount as normalized ETH.
pub fn from_base_units(value: U256) -> Result<Decimal> {
    let wei = u128::try_from(value)
        .ok()
        .and_then(|wei| i128::try_from(wei).ok())
        .ok_or_else(|| anyhow::anyhow!("wei amount {value} does not fit in a decimal"))?;
    let eth = Decimal::try_from_i128_with_scale(wei, ETH_DECIMALS)?;
    Ok(eth.normalize())
}
