// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transport encryption errors.

use axum::http::StatusCode;

/// Error raised while sealing or opening a chunked RSA body.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A chunk is not base64 or decrypts under neither key generation
    #[error("Encrypted data is corrupt. May have been encrypted using incorrect key.")]
    InvalidEncryptedData,

    /// Decrypted bytes are not UTF-8 text
    #[error("Encrypted data does not contain UTF-8 text.")]
    InvalidText,

    /// Caller-supplied key is not a base64 DER RSA public key
    #[error("encryption_key is not a valid RSA public key.")]
    InvalidPublicKey,

    #[error("RSA key generation failed: {0}")]
    KeyGeneration(rsa::Error),

    #[error("RSA encryption failed: {0}")]
    Encryption(rsa::Error),

    #[error("public key encoding failed: {0}")]
    KeyEncoding(String),
}

impl CodecError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CodecError::InvalidEncryptedData | CodecError::InvalidText => "invalid_encrypted_data",
            CodecError::InvalidPublicKey => "invalid_encryption_key",
            CodecError::KeyGeneration(_)
            | CodecError::Encryption(_)
            | CodecError::KeyEncoding(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CodecError::InvalidEncryptedData
            | CodecError::InvalidText
            | CodecError::InvalidPublicKey => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults_are_bad_requests() {
        assert_eq!(CodecError::InvalidEncryptedData.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(CodecError::InvalidText.error_code(), "invalid_encrypted_data");
        assert_eq!(CodecError::InvalidPublicKey.error_code(), "invalid_encryption_key");
    }

    #[test]
    fn key_failures_are_internal() {
        let err = CodecError::KeyEncoding("bad".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "internal_error");
    }
}
