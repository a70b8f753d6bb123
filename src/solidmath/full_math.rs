use crate::solidmath::fixed_point::MANTISSA_ONE;
use crate::solidmath::U256;
use anyhow::{anyhow, Result};

/// a * b / div with a 512 bit intermediate, truncating.
pub fn muldiv(a: U256, b: U256, div: U256) -> Result<U256> {
    let res = a.full_mul(b).checked_div(div.into());
    match res {
        Some(u512) => U256::try_from(u512).map_err(|e| anyhow!("{:?}", e)),
        None => Err(anyhow!("denominator was zero.")),
    }
}

/// multiplies by a 1e18 mantissa, e.g. vtoken amount * exchange rate -> underlying amount.
pub fn mul_mantissa(amount: U256, mantissa: U256) -> Result<U256> {
    muldiv(amount, mantissa, *MANTISSA_ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muldiv_survives_intermediate_overflow() {
        let big = U256::MAX / 2;
        assert_eq!(muldiv(big, U256::from(4), U256::from(4)).unwrap(), big);
    }

    #[test]
    fn muldiv_truncates() {
        assert_eq!(
            muldiv(U256::from(10), U256::from(10), U256::from(3)).unwrap(),
            U256::from(33)
        );
    }

    #[test]
    fn muldiv_rejects_zero_denominator() {
        assert!(muldiv(U256::one(), U256::one(), U256::zero()).is_err());
    }

    #[test]
    fn muldiv_rejects_overflowing_result() {
        assert!(muldiv(U256::MAX, U256::from(2), U256::one()).is_err());
    }

    #[test]
    fn exchange_rate_conversion() {
        // 0.02 underlying per vtoken
        let rate = U256::from(20_000_000_000_000_000u64);
        assert_eq!(
            mul_mantissa(U256::from(5_000u64), rate).unwrap(),
            U256::from(100u64)
        );
    }
}
