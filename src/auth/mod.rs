// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Transport Encryption
//!
//! Every request body except `GET /api/get-key` is sealed with the server's
//! current RSA public key.
//!
//! ## Request Flow
//!
//! 1. Client fetches the server key from `GET /api/get-key`
//! 2. Client seals a JSON object (which may carry its own one-time
//!    `encryption_key`) and POSTs the ciphertext
//! 3. Server:
//!    - Opens the body with the current key, or the previous one after a
//!      rotation
//!    - Validates fields and the Ed25519 signature
//!    - Seals the reply to `encryption_key` when one was supplied
//!
//! Private keys never leave the [`KeyRing`] and are never logged.

pub mod codec;
pub mod error;
pub mod keyring;

pub use codec::{
    encode_public_key, parse_public_key, seal, CIPHERTEXT_CHUNK_SIZE, PLAINTEXT_CHUNK_SIZE,
    PUBLIC_KEY_B64_LEN,
};
pub use error::CodecError;
pub use keyring::{plan_rotation, KeyGeneration, KeyRing, PreviousSlot, RotationPlan};
