//! Pure transition function of the payment authorization flow.
//!
//! `transition` never performs I/O. Remote calls and secret writes are
//! returned as [`Effect`]s; their results come back in as events.

use super::ports::{PaymentRequest, SubmissionOutcome, SubmissionReceipt};
use super::session::{Amount, FailureReason, PaymentSession, PinState, State};
use crate::error::{PaymentError, Result};

/// Digits in a UPI PIN.
pub const PIN_LENGTH: usize = 4;

/// Shown when a flagged submission arrives without reason text.
pub const DEFAULT_FRAUD_REASON: &str = "Suspicious transaction detected.";

pub enum Event {
    EnterAmount(String),
    /// `stored` is the PIN currently held by the secret store, if any.
    SubmitPin {
        pin: String,
        stored: Option<String>,
    },
    OtpDispatched,
    OtpDispatchFailed(FailureReason),
    SubmitOtp(String),
    SubmissionAccepted(SubmissionReceipt),
    SubmissionFailed,
    Cancel,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::EnterAmount(_) => "enter amount",
            Event::SubmitPin { .. } => "submit PIN",
            Event::OtpDispatched | Event::OtpDispatchFailed(_) => "complete OTP dispatch",
            Event::SubmitOtp(_) => "submit OTP",
            Event::SubmissionAccepted(_) | Event::SubmissionFailed => "complete submission",
            Event::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Enroll the PIN in the secret store.
    StorePin(String),
    DispatchOtp,
    SubmitPayment(PaymentRequest),
}

fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}

fn rejected(state: &State, event: &Event) -> PaymentError {
    PaymentError::InvalidTransition {
        state: state.name().to_string(),
        action: event.name(),
    }
}

/// Computes the session that results from `event`, plus the effects the
/// caller must carry out. On error the input session is the current one.
pub fn transition(session: &PaymentSession, event: Event) -> Result<(PaymentSession, Vec<Effect>)> {
    let mut next = session.clone();
    let mut effects = Vec::new();

    match (&session.status, event) {
        (State::AmountPending, Event::EnterAmount(value)) => {
            next.amount = Some(Amount::parse(&value)?);
            next.status = State::PinRequired;
        }
        (State::PinRequired, Event::SubmitPin { pin, stored }) => {
            match stored {
                None => {
                    if !is_valid_pin(&pin) {
                        return Err(PaymentError::InvalidPinFormat);
                    }
                    effects.push(Effect::StorePin(pin));
                }
                Some(secret) => {
                    if pin != secret {
                        return Err(PaymentError::WrongPin);
                    }
                }
            }
            effects.push(Effect::DispatchOtp);
            next.pin_state = PinState::Verified;
            next.status = State::OtpPending { otp_sent: false };
        }
        (State::OtpPending { otp_sent: false }, Event::OtpDispatched) => {
            next.status = State::OtpPending { otp_sent: true };
        }
        (State::OtpPending { otp_sent: false }, Event::OtpDispatchFailed(reason)) => {
            next.status = State::Failed { reason };
        }
        (State::OtpPending { otp_sent: true }, Event::SubmitOtp(code)) => {
            if code.trim().is_empty() {
                return Err(PaymentError::EmptyOtp);
            }
            let Some(amount) = session.amount else {
                return Err(PaymentError::InvalidAmount);
            };
            effects.push(Effect::SubmitPayment(PaymentRequest {
                payee_id: session.payee.id.clone(),
                amount,
                otp_code: code.clone(),
                idempotency_token: session.idempotency_token,
            }));
            next.otp = Some(code);
            next.status = State::Submitting;
        }
        (State::Submitting, Event::SubmissionAccepted(receipt)) => {
            next.status = match receipt.outcome {
                SubmissionOutcome::Success => State::Succeeded {
                    balance_after: receipt.balance_after,
                },
                SubmissionOutcome::FraudBlocked => State::Blocked {
                    reason: receipt
                        .fraud_reason
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| DEFAULT_FRAUD_REASON.to_string()),
                    balance_after: receipt.balance_after,
                },
            };
        }
        (State::Submitting, Event::SubmissionFailed) => {
            // payee, amount and idempotency token are kept for the retry
            next.otp = None;
            next.status = State::OtpPending { otp_sent: true };
        }
        (State::PinRequired | State::OtpPending { .. } | State::Submitting, Event::Cancel) => {
            next.otp = None;
            next.status = State::Cancelled;
        }
        (state, event) => return Err(rejected(state, &event)),
    }

    Ok((next, effects))
}
