//! Application layer orchestrating the payment-initiation path.
//!
//! `PayeeResolver` turns scanned links and contacts into a payee;
//! `PaymentAuthorizer` takes that payee through the PIN and OTP gates,
//! driving the pure state machine in `domain::machine` and carrying out
//! its effects against the injected ports.

pub mod authorizer;
pub mod resolver;
