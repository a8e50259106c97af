//! Wallet-related types for the wallet engine
//!
//! Defines the wallet identifier, the persisted balance shape and the
//! fixed-scale decimal helpers shared by the executor, the cache and the store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wallet identifier
///
/// Opaque 128-bit identifier, never reused across distinct wallets. It is the
/// only key used for serialization lanes, cache entries and store rows.
pub type WalletId = Uuid;

/// Number of fractional digits every balance and amount is persisted with
pub const BALANCE_SCALE: u32 = 4;

/// Largest balance a wallet row can hold (NUMERIC(19,4))
pub const MAX_BALANCE: Decimal = Decimal::from_parts(
    // 9_999_999_999_999_999_999 split into lo/mid words
    0x89E7_FFFF,
    0x8AC7_2304,
    0,
    false,
    BALANCE_SCALE,
);

/// Rescale a value to the persisted balance scale
///
/// Values with fewer fractional digits are padded (`1` -> `1.0000`), so two
/// balances that are equal also print identically.
pub fn to_balance_scale(value: Decimal) -> Decimal {
    let mut value = value;
    value.rescale(BALANCE_SCALE);
    value
}

/// Snapshot of one stored wallet row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// The wallet this row belongs to
    pub wallet_id: WalletId,

    /// Committed balance at scale 4
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_max_balance_matches_numeric_19_4() {
        assert_eq!(
            MAX_BALANCE,
            Decimal::from_str("999999999999999.9999").unwrap()
        );
        assert_eq!(MAX_BALANCE.scale(), BALANCE_SCALE);
    }

    #[test]
    fn test_to_balance_scale_pads_fraction() {
        let scaled = to_balance_scale(Decimal::from(7));
        assert_eq!(scaled.to_string(), "7.0000");
    }
}
