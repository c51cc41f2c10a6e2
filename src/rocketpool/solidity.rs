use crate::Result;
use crate::errors::Error;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// 固定小数点の整数値を浮動小数に変換する (`value / 10^decimals`)
pub fn to_float(value: &BigInt, decimals: u32) -> Result<f64> {
    let decimal = BigDecimal::new(value.clone(), i64::from(decimals));
    decimal
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Overflow(decimal.to_string()).into())
}
