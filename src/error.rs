use miette::Diagnostic;
use thiserror::Error;

/// Reasons a scanned deep link cannot be turned into a payee.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrError {
    #[error("not a UPI payment link")]
    NotUpiScheme,
    #[error("UPI ID missing")]
    MissingPayeeAddress,
}

#[derive(Error, Diagnostic, Debug)]
pub enum PaymentError {
    #[error("Invalid QR: {0}")]
    InvalidQr(#[from] QrError),
    /// A contact or typed-in payee without a usable address.
    #[error("Enter a valid UPI ID or phone number")]
    MissingPayeeAddress,
    #[error("Enter a valid amount")]
    InvalidAmount,
    #[error("UPI PIN must be 4 digits")]
    InvalidPinFormat,
    #[error("Wrong PIN")]
    WrongPin,
    #[error("Enter OTP")]
    EmptyOtp,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Transaction blocked: {reason}")]
    FraudBlocked { reason: String },
    #[error("{0}")]
    SubmissionFailed(String),
    #[error("Session expired, please log in again")]
    SessionExpired,
    #[error("cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Failure reported by the remote payment service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Transport failure or timeout; the request may not have arrived.
    #[error("{0}")]
    Network(String),
    /// The service answered and refused the request.
    #[error("{0}")]
    Rejected(String),
}

impl From<ServiceError> for PaymentError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Network(message) => PaymentError::NetworkError(message),
            ServiceError::Rejected(message) => PaymentError::SubmissionFailed(message),
        }
    }
}
