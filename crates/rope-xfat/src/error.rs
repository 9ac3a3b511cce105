//! Error types for xFAT operations

use thiserror::Error;

/// Result type alias for xFAT operations
pub type Result<T> = std::result::Result<T, XFatError>;

/// Errors that can occur in xFAT operations
///
/// Every failure aborts the whole call: no partial state survives it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XFatError {
    // === Input ===
    /// Amount of zero passed to a redemption or deposit
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Account balance too small for the operation
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u128, available: u128 },

    /// Spender allowance too small
    #[error("Insufficient allowance: need {required}, have {available}")]
    InsufficientAllowance { required: u128, available: u128 },

    /// Null or otherwise unusable address
    #[error("Invalid address")]
    InvalidAddress,

    /// Unknown redemption mode code
    #[error("Invalid redeem type: {0}")]
    InvalidRedeemType(u8),

    // === Access ===
    /// Neither party is allow-listed and the sender is no recognized source
    #[error("Transfer not allowed: xFAT is non-transferable for these parties")]
    TransferNotAllowed,

    /// Caller does not hold the role required by the operation
    #[error("Caller is not authorized for this operation")]
    NotAuthorized,

    /// Operation attempted while paused
    #[error("Engine is paused")]
    Paused,

    /// Nested call into the router or ledger during an in-flight call
    #[error("Re-entrant call rejected")]
    ReentrantCall,

    // === Configuration ===
    /// Administrative parameter out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    // === Arithmetic ===
    /// Fixed-point computation overflowed its target width
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    // === Collaborators ===
    /// Required external collaborator has not been configured
    #[error("Collaborator not set: {0}")]
    CollaboratorNotSet(&'static str),

    /// External collaborator rejected the call
    #[error("Collaborator call failed: {0}")]
    CollaboratorFailed(String),
}

impl XFatError {
    /// Stable numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::ZeroAmount => 2001,
            Self::InsufficientBalance { .. } => 2002,
            Self::InsufficientAllowance { .. } => 2003,
            Self::InvalidAddress => 2004,
            Self::InvalidRedeemType(_) => 2005,
            Self::TransferNotAllowed => 2101,
            Self::NotAuthorized => 2102,
            Self::Paused => 2103,
            Self::ReentrantCall => 2104,
            Self::InvalidParameter(_) => 2201,
            Self::Config(_) => 2202,
            Self::ArithmeticOverflow => 2301,
            Self::CollaboratorNotSet(_) => 2401,
            Self::CollaboratorFailed(_) => 2402,
        }
    }

    /// Whether resubmitting the same call later may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Paused
                | Self::ReentrantCall
                | Self::InsufficientBalance { .. }
                | Self::InsufficientAllowance { .. }
                | Self::CollaboratorNotSet(_)
                | Self::CollaboratorFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(XFatError::ZeroAmount.code(), 2001);
        assert_eq!(XFatError::TransferNotAllowed.code(), 2101);
        assert_eq!(XFatError::CollaboratorNotSet("locker").code(), 2401);
    }

    #[test]
    fn test_error_display() {
        let err = XFatError::InsufficientBalance { required: 10, available: 3 };
        let msg = format!("{}", err);
        assert!(msg.contains("need 10"));
        assert!(msg.contains("have 3"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(XFatError::Paused.is_recoverable());
        assert!(!XFatError::InvalidRedeemType(7).is_recoverable());
        assert!(!XFatError::TransferNotAllowed.is_recoverable());
    }
}
