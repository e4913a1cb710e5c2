// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chunked RSA transport encryption.
//!
//! A body is split into 190-byte plaintext chunks. Each chunk is encrypted
//! independently with RSA-2048 PKCS#1 v1.5 and base64-encoded, which always
//! yields 344 characters. The encoded chunks are concatenated in order.

use base64ct::{Base64, Encoding};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use super::error::CodecError;

/// Plaintext bytes per RSA block.
pub const PLAINTEXT_CHUNK_SIZE: usize = 190;

/// Base64 characters per encrypted block.
pub const CIPHERTEXT_CHUNK_SIZE: usize = 344;

/// Length of a base64 DER (SubjectPublicKeyInfo) RSA-2048 public key.
pub const PUBLIC_KEY_B64_LEN: usize = 392;

/// Parse a base64 DER public key.
pub fn parse_public_key(public_key_b64: &str) -> Result<RsaPublicKey, CodecError> {
    let der = Base64::decode_vec(public_key_b64).map_err(|_| CodecError::InvalidPublicKey)?;
    RsaPublicKey::from_public_key_der(&der).map_err(|_| CodecError::InvalidPublicKey)
}

/// Base64 DER encoding of a public key.
pub fn encode_public_key(public_key: &RsaPublicKey) -> Result<String, CodecError> {
    let der = public_key
        .to_public_key_der()
        .map_err(|e| CodecError::KeyEncoding(e.to_string()))?;
    Ok(Base64::encode_string(der.as_bytes()))
}

/// Encrypt `plaintext` for the holder of `public_key`.
pub fn seal(public_key: &RsaPublicKey, plaintext: &[u8]) -> Result<String, CodecError> {
    let mut rng = OsRng;
    let chunks = plaintext.len().div_ceil(PLAINTEXT_CHUNK_SIZE);
    let mut sealed = String::with_capacity(chunks * CIPHERTEXT_CHUNK_SIZE);
    for chunk in plaintext.chunks(PLAINTEXT_CHUNK_SIZE) {
        let ciphertext = public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, chunk)
            .map_err(CodecError::Encryption)?;
        sealed.push_str(&Base64::encode_string(&ciphertext));
    }
    Ok(sealed)
}

/// Decrypt a sealed body with the first key that opens each chunk.
///
/// Every chunk is tried against `keys` in order.
pub fn open(keys: &[&RsaPrivateKey], sealed: &str) -> Result<Vec<u8>, CodecError> {
    let chunks = sealed.len() / CIPHERTEXT_CHUNK_SIZE;
    let mut plaintext = Vec::with_capacity(chunks * PLAINTEXT_CHUNK_SIZE);
    for chunk in sealed.as_bytes().chunks(CIPHERTEXT_CHUNK_SIZE) {
        let encoded = std::str::from_utf8(chunk).map_err(|_| CodecError::InvalidEncryptedData)?;
        let ciphertext = Base64::decode_vec(encoded).map_err(|_| CodecError::InvalidEncryptedData)?;
        let block = keys
            .iter()
            .find_map(|key| key.decrypt(Pkcs1v15Encrypt, &ciphertext).ok())
            .ok_or(CodecError::InvalidEncryptedData)?;
        plaintext.extend_from_slice(&block);
    }
    Ok(plaintext)
}
