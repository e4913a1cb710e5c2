// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! ledger policy used throughout the application. Configuration is loaded
//! from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the ledger database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `ADMIN_ADDRESS` | Fee collection address (44-char base64) | built-in admin address |
//! | `MAX_REQUEST_SIZE` | Maximum request body in bytes | `1048576` |
//! | `SWEEP_INTERVAL_SECS` | Period of the expired-row sweeper | `10` |
//! | `STORAGE_MAX_SESSIONS` | Concurrent storage sessions | `50` |
//! | `STORAGE_LOCK_TIMEOUT_MS` | Maximum wait for a session or the write lock | `5000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Environment variable name for the ledger data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Environment variable overriding the fee collection address.
pub const ADMIN_ADDRESS_ENV: &str = "ADMIN_ADDRESS";
pub const MAX_REQUEST_SIZE_ENV: &str = "MAX_REQUEST_SIZE";
pub const SWEEP_INTERVAL_ENV: &str = "SWEEP_INTERVAL_SECS";
pub const STORAGE_MAX_SESSIONS_ENV: &str = "STORAGE_MAX_SESSIONS";
pub const STORAGE_LOCK_TIMEOUT_ENV: &str = "STORAGE_LOCK_TIMEOUT_MS";
/// `json` selects structured log output, anything else is human readable.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// File name of the redb database inside `DATA_DIR`.
pub const LEDGER_DB_FILE: &str = "ledger.redb";

/// Default fee sink: base64 of
/// `e734ea6c2b6257de72355e472aa05a4c487e6b463c029ed306df2f01b5636b58`.
pub const DEFAULT_ADMIN_ADDRESS: &str = "5zTqbCtiV95yNV5HKqBaTEh+a0Y8Ap7TBt8vAbVja1g=";

const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_MAX_SESSIONS: usize = 50;
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Limits and fees enforced by the ledger and the request validator.
#[derive(Debug, Clone)]
pub struct LedgerPolicy {
    /// Address credited with every fee.
    pub admin_address: String,
    /// Share of a transfer charged as a fee (before clamping).
    pub transfer_fee_rate: Decimal,
    pub min_transfer_fee: Decimal,
    pub max_transfer_fee: Decimal,
    /// Flat fee charged when a transaction is created.
    pub transaction_creation_fee: Decimal,
    /// Flat fee charged when an alias is registered.
    pub alias_creation_fee: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Maximum number of fractional digits in an amount.
    pub amount_precision: u32,
    /// Upper bounds (seconds from now) for the different expiry fields.
    pub max_request_expiry: i64,
    pub max_transaction_expiry: i64,
    pub max_alias_expiry: i64,
    /// Grace window after a transaction expires before it is deleted.
    pub deletion_delay: i64,
    /// Attempts at generating a unique transaction id.
    pub id_generation_attempts: usize,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            admin_address: DEFAULT_ADMIN_ADDRESS.to_string(),
            transfer_fee_rate: dec!(0.01),
            min_transfer_fee: dec!(0.00001),
            max_transfer_fee: dec!(1),
            transaction_creation_fee: dec!(0.00001),
            alias_creation_fee: dec!(0.00001),
            min_amount: dec!(0.00001),
            max_amount: dec!(99999999999999.99999),
            amount_precision: 5,
            max_request_expiry: 60,
            max_transaction_expiry: 3600,
            max_alias_expiry: 86_400,
            deletion_delay: 3600,
            id_generation_attempts: 5,
        }
    }
}

/// Process-wide configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub max_request_size: usize,
    pub sweep_interval: Duration,
    pub storage_max_sessions: usize,
    pub storage_lock_timeout: Duration,
    pub json_logs: bool,
    pub policy: LedgerPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            storage_max_sessions: DEFAULT_MAX_SESSIONS,
            storage_lock_timeout: DEFAULT_LOCK_TIMEOUT,
            json_logs: false,
            policy: LedgerPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut policy = LedgerPolicy::default();
        if let Some(address) = lookup(ADMIN_ADDRESS_ENV) {
            if crate::validation::fields::is_address(&address) {
                policy.admin_address = address;
            } else {
                tracing::warn!(
                    variable = ADMIN_ADDRESS_ENV,
                    "Ignoring admin address that is not a 32-byte base64 address"
                );
            }
        }

        Self {
            host: lookup(HOST_ENV).unwrap_or(defaults.host),
            port: parse_or(&lookup, PORT_ENV, defaults.port),
            data_dir: lookup(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_request_size: parse_or(&lookup, MAX_REQUEST_SIZE_ENV, defaults.max_request_size),
            sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                SWEEP_INTERVAL_ENV,
                defaults.sweep_interval.as_secs(),
            )),
            storage_max_sessions: parse_or(
                &lookup,
                STORAGE_MAX_SESSIONS_ENV,
                defaults.storage_max_sessions,
            )
            .max(1),
            storage_lock_timeout: Duration::from_millis(parse_or(
                &lookup,
                STORAGE_LOCK_TIMEOUT_ENV,
                defaults.storage_lock_timeout.as_millis() as u64,
            )),
            json_logs: lookup(LOG_FORMAT_ENV)
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            policy,
        }
    }

    /// Path of the ledger database file.
    pub fn ledger_db_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_DB_FILE)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
