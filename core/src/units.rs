//! Offline helpers: address format check and base-unit conversion.

use std::sync::LazyLock;

use regex::Regex;

/// Base units in one whole token.
pub const BASE_UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

const BASE_UNITS_PER_TOKEN_F64: f64 = 1e18;

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern is valid")
});

/// True iff `address` is `0x` followed by exactly 40 hex digits.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address)
}

/// `2^128`, the first scaled value `u128` cannot hold.
const BASE_UNITS_CEILING_F64: f64 = u128::MAX as f64;

/// `round(amount * 10^18)`. Negative and NaN amounts clamp to zero.
///
/// `u128` holds at most about `3.4e20` whole tokens; larger amounts (and
/// infinity) saturate at `u128::MAX` and no longer round-trip. Use
/// `checked_to_base_units` to detect that case.
pub fn to_base_units(amount: f64) -> u128 {
    if amount.is_nan() || amount <= 0.0 {
        return 0;
    }
    (amount * BASE_UNITS_PER_TOKEN_F64).round() as u128
}

/// Like `to_base_units`, but `None` when the amount does not fit in `u128`.
pub fn checked_to_base_units(amount: f64) -> Option<u128> {
    if amount.is_nan() || amount <= 0.0 {
        return Some(0);
    }
    let scaled = (amount * BASE_UNITS_PER_TOKEN_F64).round();
    (scaled < BASE_UNITS_CEILING_F64).then_some(scaled as u128)
}

pub fn from_base_units(units: u128) -> f64 {
    units as f64 / BASE_UNITS_PER_TOKEN_F64
}
