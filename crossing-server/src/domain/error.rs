//! Domain error types.
//!
//! Validation failures for values entering the domain from requests or
//! storage. Distinct from I/O errors.

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Phone number failed validation
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(&'static str),
}
