use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("gateway error: {0}")]
    GatewayError(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl PaymentError {
    /// Prefixes the message with the name of the failing operation, keeping the kind.
    pub fn context(self, op: &str) -> Self {
        match self {
            Self::NotFound(msg) => Self::NotFound(format!("{op}: {msg}")),
            Self::ValidationError(msg) => Self::ValidationError(format!("{op}: {msg}")),
            Self::GatewayError(msg) => Self::GatewayError(format!("{op}: {msg}")),
            Self::StorageError(msg) => Self::StorageError(format!("{op}: {msg}")),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_kind() {
        let err = PaymentError::StorageError("disk full".to_string()).context("persist payment");
        assert_eq!(
            err,
            PaymentError::StorageError("persist payment: disk full".to_string())
        );
        assert_eq!(err.to_string(), "storage error: persist payment: disk full");
    }

    #[test]
    fn test_is_not_found() {
        assert!(PaymentError::NotFound("id".into()).is_not_found());
        assert!(!PaymentError::GatewayError("down".into()).is_not_found());
    }
}
