use crate::solidmath::U256;
use anyhow::{anyhow, ensure, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

pub const MANTISSA_DECIMALS: u32 = 18;
/// oracle prices come back scaled by 10^(36 - underlying decimals)
pub const PRICE_DECIMALS: u32 = 36;

lazy_static! {
    pub static ref MANTISSA_ONE: U256 = exponent_to_u256(MANTISSA_DECIMALS);
}

pub fn exponent_to_u256(decimals: u32) -> U256 {
    U256::exp10(decimals as usize)
}

pub fn to_big_int(value: U256) -> Result<BigInt> {
    BigInt::parse_bytes(value.to_string().as_bytes(), 10)
        .ok_or_else(|| anyhow!("could not read {} as a big integer", value))
}

/// value / 10^decimals, exact.
pub fn mantissa_to_decimal(value: U256, decimals: u32) -> Result<BigDecimal> {
    Ok(BigDecimal::new(to_big_int(value)?, decimals as i64))
}

/// drops digits past `decimals`, never rounds.
pub fn truncate(value: &BigDecimal, decimals: u32) -> BigDecimal {
    value.with_scale(decimals as i64)
}

/// USD price of one whole underlying token, truncated to the underlying's precision.
pub fn price_to_usd(price_mantissa: U256, underlying_decimals: u32) -> Result<BigDecimal> {
    ensure!(
        underlying_decimals <= PRICE_DECIMALS,
        "underlying has {} decimals, more than the oracle scale",
        underlying_decimals
    );
    let price = mantissa_to_decimal(price_mantissa, PRICE_DECIMALS - underlying_decimals)?;
    Ok(truncate(&price, underlying_decimals))
}
