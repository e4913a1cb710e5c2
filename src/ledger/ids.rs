// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction id generation.

use rand::Rng;

/// Source of candidate 32-digit transaction ids.
pub trait TransactionIdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Ids made of the 12 low-order digits of the current time in 100 ns ticks
/// followed by 20 random digits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockRandomIds;

const CLOCK_MODULUS: i64 = 1_000_000_000_000;
const RANDOM_LOW: u128 = 10_000_000_000_000_000_000;
const RANDOM_HIGH: u128 = 100_000_000_000_000_000_000;

impl TransactionIdSource for ClockRandomIds {
    fn next_id(&self) -> String {
        let ticks = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() / 100;
        let clock = ticks.rem_euclid(CLOCK_MODULUS);
        let random: u128 = rand::thread_rng().gen_range(RANDOM_LOW..RANDOM_HIGH);
        format!("{clock:012}{random}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_32_digits() {
        let source = ClockRandomIds;
        for _ in 0..64 {
            let id = source.next_id();
            assert_eq!(id.len(), 32, "{id}");
            assert!(id.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn consecutive_ids_differ() {
        let source = ClockRandomIds;
        assert_ne!(source.next_id(), source.next_id());
    }
}
