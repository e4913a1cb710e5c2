// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request validation errors.

/// Why a decrypted request was rejected before reaching the ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Every declared field absent from the request, in declaration order
    #[error("Missing {} in JSON data", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    /// First field that failed its syntax check
    #[error("{reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid JSON data in encrypted data.")]
    InvalidJson,
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Wire error code reported in `error_message`.
    pub fn error_code(&self) -> String {
        match self {
            ValidationError::MissingKeys(_) => "missing_keys".to_string(),
            ValidationError::InvalidField { field, .. } => format!("invalid_{field}"),
            ValidationError::InvalidSignature => "invalid_signature".to_string(),
            ValidationError::InvalidJson => "invalid_json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_are_listed_in_order() {
        let err = ValidationError::MissingKeys(vec!["request_id", "signature"]);
        assert_eq!(err.to_string(), "Missing request_id, signature in JSON data");
        assert_eq!(err.error_code(), "missing_keys");
    }

    #[test]
    fn field_errors_are_prefixed() {
        let err = ValidationError::invalid("master_key", "master_key length is incorrect.");
        assert_eq!(err.error_code(), "invalid_master_key");
        assert_eq!(err.to_string(), "master_key length is incorrect.");
    }
}
