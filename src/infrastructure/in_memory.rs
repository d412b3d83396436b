use crate::domain::contact::DeviceContact;
use crate::domain::ports::{
    ContactSource, PaymentRequest, PaymentService, SecretStore, SubmissionOutcome,
    SubmissionReceipt,
};
use crate::domain::session::{Amount, Balance, IdempotencyToken};
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory secret store.
///
/// Clones share the same map, so a test can keep a handle while the
/// authorizer owns another.
#[derive(Default, Clone)]
pub struct InMemorySecretStore {
    secrets: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(key: &str, value: &str) -> Self {
        let secrets = HashMap::from([(key.to_string(), value.to_string())]);
        Self {
            secrets: Arc::new(RwLock::new(secrets)),
        }
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, key: &str) -> Result<Option<String>> {
        let secrets = self.secrets.read().await;
        Ok(secrets.get(key).cloned())
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        let mut secrets = self.secrets.write().await;
        secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A call received by [`InMemoryPaymentService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    RequestOtp { auth_token: String },
    SubmitPayment { auth_token: String, request: PaymentRequest },
}

#[derive(Default)]
struct Ledger {
    balance: Balance,
    offline: bool,
    expected_otp: Option<String>,
    rejection: Option<String>,
    fraud_threshold: Option<(Amount, String)>,
    settled: HashMap<IdempotencyToken, SubmissionReceipt>,
    calls: Vec<ServiceCall>,
}

/// Simulated payment backend holding a single account balance.
///
/// Submissions debit the balance once per idempotency token; a repeated
/// token returns the receipt of the first settlement.
#[derive(Default, Clone)]
pub struct InMemoryPaymentService {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryPaymentService {
    pub fn new(opening_balance: Balance) -> Self {
        let ledger = Ledger {
            balance: opening_balance,
            ..Ledger::default()
        };
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Every call fails as if the network were down.
    pub async fn set_offline(&self, offline: bool) {
        self.ledger.write().await.offline = offline;
    }

    /// Only submissions carrying `code` are accepted.
    pub async fn require_otp(&self, code: &str) {
        self.ledger.write().await.expected_otp = Some(code.to_string());
    }

    /// Every submission is refused with `message`.
    pub async fn reject_submissions(&self, message: &str) {
        self.ledger.write().await.rejection = Some(message.to_string());
    }

    /// Payments of at least `threshold` settle but are flagged with `reason`.
    pub async fn flag_fraud_from(&self, threshold: Amount, reason: &str) {
        self.ledger.write().await.fraud_threshold = Some((threshold, reason.to_string()));
    }

    pub async fn balance(&self) -> Balance {
        self.ledger.read().await.balance
    }

    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.ledger.read().await.calls.clone()
    }

    pub async fn otp_requests(&self) -> usize {
        self.ledger
            .read()
            .await
            .calls
            .iter()
            .filter(|call| matches!(call, ServiceCall::RequestOtp { .. }))
            .count()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn request_otp(&self, auth_token: &str) -> std::result::Result<(), ServiceError> {
        let mut ledger = self.ledger.write().await;
        ledger.calls.push(ServiceCall::RequestOtp {
            auth_token: auth_token.to_string(),
        });
        if ledger.offline {
            return Err(ServiceError::Network("OTP send failed".to_string()));
        }
        Ok(())
    }

    async fn submit_payment(
        &self,
        auth_token: &str,
        request: &PaymentRequest,
    ) -> std::result::Result<SubmissionReceipt, ServiceError> {
        let mut ledger = self.ledger.write().await;
        ledger.calls.push(ServiceCall::SubmitPayment {
            auth_token: auth_token.to_string(),
            request: request.clone(),
        });

        if ledger.offline {
            return Err(ServiceError::Network("Transaction Failed".to_string()));
        }
        if let Some(receipt) = ledger.settled.get(&request.idempotency_token) {
            return Ok(receipt.clone());
        }
        if let Some(message) = &ledger.rejection {
            return Err(ServiceError::Rejected(message.clone()));
        }
        if let Some(expected) = &ledger.expected_otp
            && expected != &request.otp_code
        {
            return Err(ServiceError::Rejected("Invalid OTP".to_string()));
        }
        if ledger.balance.0 < request.amount.to_major() {
            return Err(ServiceError::Rejected("Insufficient balance".to_string()));
        }

        ledger.balance = ledger.balance.debit(request.amount);
        let fraud_reason = ledger
            .fraud_threshold
            .as_ref()
            .filter(|(threshold, _)| request.amount >= *threshold)
            .map(|(_, reason)| reason.clone());
        let receipt = SubmissionReceipt {
            outcome: if fraud_reason.is_some() {
                SubmissionOutcome::FraudBlocked
            } else {
                SubmissionOutcome::Success
            },
            balance_after: ledger.balance,
            fraud_reason,
        };
        ledger
            .settled
            .insert(request.idempotency_token, receipt.clone());
        Ok(receipt)
    }
}

/// Address book backed by a fixed list.
#[derive(Default, Clone)]
pub struct InMemoryContactSource {
    contacts: Vec<DeviceContact>,
}

impl InMemoryContactSource {
    pub fn new(contacts: Vec<DeviceContact>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl ContactSource for InMemoryContactSource {
    async fn contacts(&self) -> Result<Vec<DeviceContact>> {
        Ok(self.contacts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: &str, otp: &str) -> PaymentRequest {
        PaymentRequest {
            payee_id: "merchant@ybl".to_string(),
            amount: Amount::parse(amount).unwrap(),
            otp_code: otp.to_string(),
            idempotency_token: IdempotencyToken::generate(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_secret_store() {
        let store = InMemorySecretStore::new();
        assert!(store.get_secret("upiPin").await.unwrap().is_none());

        store.set_secret("upiPin", "1234").await.unwrap();
        let shared = store.clone();
        assert_eq!(
            shared.get_secret("upiPin").await.unwrap().as_deref(),
            Some("1234")
        );
    }

    #[tokio::test]
    async fn test_service_debits_once_per_token() {
        let service = InMemoryPaymentService::new(Balance::new(dec!(1000)));
        let req = request("250", "0000");

        let first = service.submit_payment("token", &req).await.unwrap();
        let replay = service.submit_payment("token", &req).await.unwrap();

        assert_eq!(first.outcome, SubmissionOutcome::Success);
        assert_eq!(first, replay);
        assert_eq!(service.balance().await, Balance::new(dec!(750)));
        assert_eq!(service.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_service_rejections() {
        let service = InMemoryPaymentService::new(Balance::new(dec!(100)));
        assert_eq!(
            service.submit_payment("token", &request("500", "0000")).await,
            Err(ServiceError::Rejected("Insufficient balance".to_string()))
        );

        service.require_otp("4321").await;
        assert_eq!(
            service.submit_payment("token", &request("5", "0000")).await,
            Err(ServiceError::Rejected("Invalid OTP".to_string()))
        );

        service.set_offline(true).await;
        assert!(matches!(
            service.request_otp("token").await,
            Err(ServiceError::Network(_))
        ));
        assert_eq!(service.balance().await, Balance::new(dec!(100)));
    }

    #[tokio::test]
    async fn test_service_flags_large_payments() {
        let service = InMemoryPaymentService::new(Balance::new(dec!(100000)));
        service
            .flag_fraud_from(Amount::parse("50000").unwrap(), "High-value transfer")
            .await;

        let small = service.submit_payment("token", &request("10", "1")).await.unwrap();
        assert_eq!(small.outcome, SubmissionOutcome::Success);

        let large = service
            .submit_payment("token", &request("60000", "1"))
            .await
            .unwrap();
        assert_eq!(large.outcome, SubmissionOutcome::FraudBlocked);
        assert_eq!(large.fraud_reason.as_deref(), Some("High-value transfer"));
        assert_eq!(large.balance_after, Balance::new(dec!(39990)));
    }
}
