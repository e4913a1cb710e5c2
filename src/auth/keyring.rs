// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transport Key Ring
//!
//! The server holds two generations of its RSA-2048 transport key:
//!
//! - **current**: advertised by `GET /api/get-key`, replaced once it is an
//!   hour old (generation timestamps are aligned to hour boundaries)
//! - **previous**: decrypt-only fallback for clients that fetched the key
//!   just before a rotation, dropped once it is 90 minutes old
//!
//! Rotation happens lazily when the public key is fetched. Each generation is
//! immutable; rotating swaps `Arc`s under a short lock, and decryption works
//! on a snapshot taken outside of it.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use tracing::{error, info};

use super::codec::{encode_public_key, open};
use super::error::CodecError;

const RSA_BITS: usize = 2048;

/// Age at which the current generation is replaced.
pub const KEY_LIFETIME_SECS: i64 = 3600;
/// A replaced generation younger than this is kept as the fallback.
pub const PROMOTION_WINDOW_SECS: i64 = 7200;
/// Age at which the fallback generation is discarded.
pub const PREVIOUS_LIFETIME_SECS: i64 = 5400;

/// Start of the hour containing `now`.
pub fn hour_floor(now: i64) -> i64 {
    now.div_euclid(3600) * 3600
}

/// One RSA keypair and the time it became current.
pub struct KeyGeneration {
    private_key: RsaPrivateKey,
    public_key_b64: String,
    started_at: i64,
}

impl KeyGeneration {
    /// Mint a fresh generation.
    pub fn generate(started_at: i64) -> Result<Self, CodecError> {
        let private_key =
            RsaPrivateKey::new(&mut OsRng, RSA_BITS).map_err(CodecError::KeyGeneration)?;
        Self::from_private_key(private_key, started_at)
    }

    pub fn from_private_key(
        private_key: RsaPrivateKey,
        started_at: i64,
    ) -> Result<Self, CodecError> {
        let public_key_b64 = encode_public_key(&private_key.to_public_key())?;
        Ok(Self {
            private_key,
            public_key_b64,
            started_at,
        })
    }

    /// Base64 DER (SubjectPublicKeyInfo) public key.
    pub fn public_key_b64(&self) -> &str {
        &self.public_key_b64
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }
}

/// What happens to the fallback slot during a key fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviousSlot {
    Keep,
    /// The outgoing current generation becomes the fallback
    PromoteCurrent,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPlan {
    pub mint_current: bool,
    pub previous: PreviousSlot,
}

/// Decide the rotation performed by a key fetch at `now`.
pub fn plan_rotation(
    current_started: i64,
    previous_started: Option<i64>,
    now: i64,
) -> RotationPlan {
    let current_age = now - current_started;

    if current_age >= KEY_LIFETIME_SECS {
        let previous = if current_age < PROMOTION_WINDOW_SECS
            && current_age < PREVIOUS_LIFETIME_SECS
        {
            PreviousSlot::PromoteCurrent
        } else {
            PreviousSlot::Clear
        };
        return RotationPlan {
            mint_current: true,
            previous,
        };
    }

    let previous = match previous_started {
        Some(started) if now - started >= PREVIOUS_LIFETIME_SECS => PreviousSlot::Clear,
        _ => PreviousSlot::Keep,
    };
    RotationPlan {
        mint_current: false,
        previous,
    }
}

struct RingState {
    current: Arc<KeyGeneration>,
    previous: Option<Arc<KeyGeneration>>,
}

/// Rotating pair of transport keys.
pub struct KeyRing {
    state: Mutex<RingState>,
}

impl KeyRing {
    /// Create a ring with a fresh current generation.
    ///
    /// Fails only if RSA key generation fails.
    pub fn new(now: i64) -> Result<Self, CodecError> {
        let current = KeyGeneration::generate(hour_floor(now))?;
        info!(started_at = current.started_at(), "Generated transport key");
        Ok(Self::from_generations(current, None))
    }

    pub fn from_generations(current: KeyGeneration, previous: Option<KeyGeneration>) -> Self {
        Self {
            state: Mutex::new(RingState {
                current: Arc::new(current),
                previous: previous.map(Arc::new),
            }),
        }
    }

    fn snapshot(&self) -> (Arc<KeyGeneration>, Option<Arc<KeyGeneration>>) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        (state.current.clone(), state.previous.clone())
    }

    /// Current public key, rotating first if the current generation is due.
    ///
    /// Key generation is CPU heavy; async callers should run this on the
    /// blocking pool. If minting a new generation fails the existing one is
    /// kept and the failure is logged.
    pub fn public_key(&self, now: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let plan = plan_rotation(
            state.current.started_at(),
            state.previous.as_ref().map(|p| p.started_at()),
            now,
        );

        if plan.mint_current {
            match KeyGeneration::generate(hour_floor(now)) {
                Ok(fresh) => {
                    let outgoing = std::mem::replace(&mut state.current, Arc::new(fresh));
                    state.previous = match plan.previous {
                        PreviousSlot::PromoteCurrent => Some(outgoing),
                        PreviousSlot::Clear => None,
                        PreviousSlot::Keep => state.previous.take(),
                    };
                    info!(
                        started_at = state.current.started_at(),
                        previous_started_at = ?state.previous.as_ref().map(|p| p.started_at()),
                        "Rotated transport key"
                    );
                }
                Err(e) => error!(error = %e, "Transport key rotation failed, keeping current key"),
            }
        } else if plan.previous == PreviousSlot::Clear {
            state.previous = None;
            info!("Dropped previous transport key");
        }

        state.current.public_key_b64().to_string()
    }

    /// Decrypt a sealed body with the current key, falling back to the
    /// previous one while it is younger than its lifetime.
    pub fn decrypt(&self, sealed: &str, now: i64) -> Result<Vec<u8>, CodecError> {
        let (current, previous) = self.snapshot();
        let previous = previous.filter(|p| now - p.started_at() < PREVIOUS_LIFETIME_SECS);

        let mut keys = vec![&current.private_key];
        if let Some(previous) = previous.as_ref() {
            keys.push(&previous.private_key);
        }
        open(&keys, sealed)
    }
}
