use super::contact::DeviceContact;
use super::session::{Amount, Balance, IdempotencyToken};
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Device-local key/value storage for secrets (PIN, auth token).
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, key: &str) -> Result<Option<String>>;
    async fn set_secret(&self, key: &str, value: &str) -> Result<()>;
}

/// Payment submitted once the OTP has been entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payee_id: String,
    pub amount: Amount,
    pub otp_code: String,
    pub idempotency_token: IdempotencyToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success,
    /// Recorded by the service but flagged as suspicious.
    FraudBlocked,
}

/// Response to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub outcome: SubmissionOutcome,
    pub balance_after: Balance,
    pub fraud_reason: Option<String>,
}

/// Remote side of the payment flow: OTP dispatch and submission.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn request_otp(&self, auth_token: &str) -> std::result::Result<(), ServiceError>;

    async fn submit_payment(
        &self,
        auth_token: &str,
        request: &PaymentRequest,
    ) -> std::result::Result<SubmissionReceipt, ServiceError>;
}

/// Provider of the device address book.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn contacts(&self) -> Result<Vec<DeviceContact>>;
}

pub type SecretStoreBox = Box<dyn SecretStore>;
pub type PaymentServiceBox = Box<dyn PaymentService>;
pub type ContactSourceBox = Box<dyn ContactSource>;
