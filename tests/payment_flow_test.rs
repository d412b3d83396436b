use grampay::application::authorizer::{AuthorizerConfig, PaymentAuthorizer, PaymentOutcome};
use grampay::application::resolver::PayeeResolver;
use grampay::domain::payee::PayeeDescriptor;
use grampay::domain::ports::SecretStore;
use grampay::domain::session::{Amount, Balance, State};
use grampay::error::PaymentError;
use grampay::infrastructure::in_memory::{
    InMemoryContactSource, InMemoryPaymentService, InMemorySecretStore, ServiceCall,
};
use rust_decimal_macros::dec;

fn authorizer(
    payee: PayeeDescriptor,
    secrets: &InMemorySecretStore,
    service: &InMemoryPaymentService,
) -> PaymentAuthorizer {
    PaymentAuthorizer::new(
        payee,
        Box::new(secrets.clone()),
        Box::new(service.clone()),
        AuthorizerConfig::default(),
    )
}

#[tokio::test]
async fn test_first_payment_from_qr_enrolls_pin() {
    let resolver = PayeeResolver::new(Box::new(InMemoryContactSource::default()));
    let payee = resolver
        .resolve_qr("upi://pay?pa=merchant@ybl&pn=Shop")
        .unwrap();

    let secrets = InMemorySecretStore::with_secret("token", "bearer");
    let service = InMemoryPaymentService::new(Balance::new(dec!(500)));
    let mut authorizer = authorizer(payee, &secrets, &service);

    authorizer.enter_amount("100").unwrap();
    authorizer.submit_pin("1234").await.unwrap();

    assert_eq!(
        secrets.get_secret("upiPin").await.unwrap().as_deref(),
        Some("1234")
    );
    assert_eq!(authorizer.state(), &State::OtpPending { otp_sent: true });
    assert_eq!(service.otp_requests().await, 1);

    let outcome = authorizer.submit_otp("4321").await.unwrap();
    assert_eq!(
        outcome,
        PaymentOutcome::Succeeded {
            balance_after: Balance::new(dec!(400))
        }
    );
}

#[tokio::test]
async fn test_later_session_rejects_wrong_pin() {
    let secrets = InMemorySecretStore::with_secret("token", "bearer");
    let service = InMemoryPaymentService::new(Balance::new(dec!(500)));

    let payee = PayeeDescriptor::manual("merchant@ybl", "Shop").unwrap();
    let mut first = authorizer(payee.clone(), &secrets, &service);
    first.enter_amount("10").unwrap();
    first.submit_pin("1234").await.unwrap();
    first.cancel().unwrap();

    let mut second = authorizer(payee, &secrets, &service);
    second.enter_amount("10").unwrap();
    let result = second.submit_pin("0000").await;

    assert!(matches!(result, Err(PaymentError::WrongPin)));
    assert_eq!(second.state(), &State::PinRequired);
    // the stored PIN is never overwritten by a later attempt
    assert_eq!(
        secrets.get_secret("upiPin").await.unwrap().as_deref(),
        Some("1234")
    );
}

#[tokio::test]
async fn test_fraud_blocked_payment_is_terminal() {
    let secrets = InMemorySecretStore::with_secret("token", "bearer");
    secrets.set_secret("upiPin", "1234").await.unwrap();
    let service = InMemoryPaymentService::new(Balance::new(dec!(100000)));
    service
        .flag_fraud_from(Amount::parse("20000").unwrap(), "Unusual amount")
        .await;

    let payee = PayeeDescriptor::from_contact("Rahul Gupta", "78945 61230").unwrap();
    let mut authorizer = authorizer(payee, &secrets, &service);
    authorizer.enter_amount("25000").unwrap();
    authorizer.submit_pin("1234").await.unwrap();

    let outcome = authorizer.submit_otp("0000").await.unwrap();
    assert_eq!(
        outcome,
        PaymentOutcome::Blocked {
            reason: "Unusual amount".to_string(),
            balance_after: Balance::new(dec!(75000)),
        }
    );
    assert!(matches!(authorizer.state(), State::Blocked { .. }));

    assert!(authorizer.submit_otp("0000").await.is_err());
    assert!(authorizer.cancel().is_err());
    assert!(authorizer.enter_amount("1").is_err());
    assert!(matches!(authorizer.state(), State::Blocked { .. }));
}

#[tokio::test]
async fn test_network_failure_on_submit_allows_retry() {
    let secrets = InMemorySecretStore::with_secret("token", "bearer");
    secrets.set_secret("upiPin", "1234").await.unwrap();
    let service = InMemoryPaymentService::new(Balance::new(dec!(100)));

    let payee = PayeeDescriptor::manual("merchant@ybl", "Shop").unwrap();
    let mut authorizer = authorizer(payee, &secrets, &service);
    authorizer.enter_amount("40").unwrap();
    authorizer.submit_pin("1234").await.unwrap();

    service.set_offline(true).await;
    let result = authorizer.submit_otp("1111").await;
    assert!(matches!(result, Err(PaymentError::NetworkError(_))));
    assert_eq!(authorizer.state(), &State::OtpPending { otp_sent: true });
    assert_eq!(authorizer.session().amount(), Amount::parse("40").ok());

    service.set_offline(false).await;
    let outcome = authorizer.submit_otp("1111").await.unwrap();
    assert_eq!(outcome.balance_after(), Balance::new(dec!(60)));

    let submitted: Vec<_> = service
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            ServiceCall::SubmitPayment { request, .. } => Some(request.idempotency_token),
            _ => None,
        })
        .collect();
    assert_eq!(submitted.len(), 2);
    assert!(submitted.iter().all(|t| *t == authorizer.session().idempotency_token()));
}

#[tokio::test]
async fn test_sessions_for_same_payee_get_distinct_tokens() {
    let secrets = InMemorySecretStore::new();
    let service = InMemoryPaymentService::default();
    let payee = PayeeDescriptor::manual("merchant@ybl", "Shop").unwrap();

    let first = authorizer(payee.clone(), &secrets, &service);
    let second = authorizer(payee, &secrets, &service);
    assert_ne!(
        first.session().idempotency_token(),
        second.session().idempotency_token()
    );
}

#[tokio::test]
async fn test_invalid_amount_never_reaches_service() {
    let secrets = InMemorySecretStore::with_secret("token", "bearer");
    let service = InMemoryPaymentService::default();
    let payee = PayeeDescriptor::manual("merchant@ybl", "Shop").unwrap();
    let mut authorizer = authorizer(payee, &secrets, &service);

    for value in ["0", "-1", "ten", ""] {
        assert!(matches!(
            authorizer.enter_amount(value),
            Err(PaymentError::InvalidAmount)
        ));
        assert_eq!(authorizer.state(), &State::AmountPending);
    }
    assert!(service.calls().await.is_empty());
}
