// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee computation.

use rust_decimal::Decimal;

use crate::config::LedgerPolicy;
use crate::storage::to_ledger_scale;

/// Fee charged on a transfer of `amount`.
///
/// The rate is applied with half-even rounding to 5 digits and the result is
/// clamped to the policy's minimum and maximum fee.
pub fn transfer_fee(amount: Decimal, policy: &LedgerPolicy) -> Decimal {
    let raw = amount
        .checked_mul(policy.transfer_fee_rate)
        .map(|fee| fee.round_dp(policy.amount_precision))
        .unwrap_or(policy.max_transfer_fee);
    to_ledger_scale(raw.clamp(policy.min_transfer_fee, policy.max_transfer_fee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn one_percent_of_regular_amounts() {
        let policy = LedgerPolicy::default();
        assert_eq!(transfer_fee(dec!(1), &policy), dec!(0.01));
        assert_eq!(transfer_fee(dec!(12.34567), &policy), dec!(0.12346));
    }

    #[test]
    fn rounding_is_half_even() {
        let policy = LedgerPolicy::default();
        // 0.0025 * 0.01 = 0.000025 -> 0.00002
        assert_eq!(transfer_fee(dec!(0.0025), &policy), dec!(0.00002));
        // 0.0035 * 0.01 = 0.000035 -> 0.00004
        assert_eq!(transfer_fee(dec!(0.0035), &policy), dec!(0.00004));
        // 0.0045 * 0.01 = 0.000045 -> 0.00004
        assert_eq!(transfer_fee(dec!(0.0045), &policy), dec!(0.00004));
    }

    #[test]
    fn fee_is_clamped() {
        let policy = LedgerPolicy::default();
        assert_eq!(transfer_fee(dec!(0.00001), &policy), dec!(0.00001));
        assert_eq!(transfer_fee(dec!(0.0005), &policy), dec!(0.00001));
        assert_eq!(transfer_fee(dec!(100), &policy), dec!(1));
        assert_eq!(transfer_fee(dec!(99999999999999.99999), &policy), dec!(1));
    }

    #[test]
    fn fee_has_ledger_scale() {
        let policy = LedgerPolicy::default();
        assert_eq!(transfer_fee(dec!(100), &policy).to_string(), "1.00000");
    }
}
