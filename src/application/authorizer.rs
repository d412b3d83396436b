use crate::domain::machine::{self, Effect, Event};
use crate::domain::payee::PayeeDescriptor;
use crate::domain::ports::{PaymentRequest, PaymentServiceBox, SecretStoreBox};
use crate::domain::session::{Balance, FailureReason, PaymentSession, State};
use crate::error::{PaymentError, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Secret store keys used by the authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizerConfig {
    /// Key of the locally enrolled UPI PIN.
    pub pin_key: String,
    /// Key of the bearer token obtained at login.
    pub auth_token_key: String,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            pin_key: "upiPin".to_string(),
            auth_token_key: "token".to_string(),
        }
    }
}

/// Terminal result of a submitted payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded { balance_after: Balance },
    /// The payment went through but was flagged by the service.
    Blocked { reason: String, balance_after: Balance },
}

impl PaymentOutcome {
    pub fn balance_after(&self) -> Balance {
        match self {
            PaymentOutcome::Succeeded { balance_after }
            | PaymentOutcome::Blocked { balance_after, .. } => *balance_after,
        }
    }

    /// Treats a flagged payment as an error, for callers that only care
    /// about clean success.
    pub fn into_result(self) -> Result<Balance> {
        match self {
            PaymentOutcome::Succeeded { balance_after } => Ok(balance_after),
            PaymentOutcome::Blocked { reason, .. } => Err(PaymentError::FraudBlocked { reason }),
        }
    }
}

/// Drives one payment session from amount entry to a terminal state.
///
/// Each operation feeds an event to [`machine::transition`] and then runs
/// the effects it returns. Only one remote call is ever outstanding, since
/// every operation borrows the authorizer mutably until it completes.
pub struct PaymentAuthorizer {
    session: PaymentSession,
    secrets: SecretStoreBox,
    service: PaymentServiceBox,
    config: AuthorizerConfig,
}

impl PaymentAuthorizer {
    /// Seeds a fresh session for `payee`.
    ///
    /// # Arguments
    ///
    /// * `secrets` - Device secret storage holding the PIN and auth token.
    /// * `service` - Remote payment service.
    pub fn new(
        payee: PayeeDescriptor,
        secrets: SecretStoreBox,
        service: PaymentServiceBox,
        config: AuthorizerConfig,
    ) -> Self {
        let session = PaymentSession::new(payee);
        info!(
            payee = %session.payee(),
            token = %session.idempotency_token(),
            "payment session started"
        );
        Self {
            session,
            secrets,
            service,
            config,
        }
    }

    pub fn session(&self) -> &PaymentSession {
        &self.session
    }

    pub fn state(&self) -> &State {
        self.session.status()
    }

    fn commit(&mut self, next: PaymentSession, action: &'static str) {
        debug!(
            from = %self.session.status(),
            to = %next.status(),
            action,
            "payment session transition"
        );
        if next.status().is_terminal() {
            info!(status = %next.status(), "payment session ended");
        }
        self.session = next;
    }

    /// Runs `event` through the state machine without committing.
    fn plan(&self, event: Event) -> Result<(PaymentSession, Vec<Effect>)> {
        let action = event.name();
        machine::transition(&self.session, event).inspect_err(|err| {
            debug!(state = %self.session.status(), action, %err, "transition refused");
        })
    }

    fn step(&mut self, event: Event) -> Result<Vec<Effect>> {
        let action = event.name();
        let (next, effects) = self.plan(event)?;
        self.commit(next, action);
        Ok(effects)
    }

    async fn auth_token(&self) -> Result<Option<String>> {
        self.secrets.get_secret(&self.config.auth_token_key).await
    }

    /// Accepts a positive rupee amount and moves on to PIN entry.
    pub fn enter_amount(&mut self, value: &str) -> Result<()> {
        self.step(Event::EnterAmount(value.to_string()))?;
        Ok(())
    }

    /// Checks the PIN (enrolling it when none is stored yet) and requests
    /// an OTP. A failed OTP request ends the session.
    pub async fn submit_pin(&mut self, pin: &str) -> Result<()> {
        if self.state() != &State::PinRequired {
            return Err(PaymentError::InvalidTransition {
                state: self.state().name().to_string(),
                action: "submit PIN",
            });
        }

        let stored = self.secrets.get_secret(&self.config.pin_key).await?;
        let event = Event::SubmitPin {
            pin: pin.to_string(),
            stored,
        };
        let action = event.name();
        let (next, effects) = self.plan(event)?;

        // enrollment must be durable before the session moves on
        for effect in &effects {
            if let Effect::StorePin(pin) = effect {
                self.secrets.set_secret(&self.config.pin_key, pin).await?;
                info!("UPI PIN enrolled");
            }
        }
        self.commit(next, action);

        if effects.contains(&Effect::DispatchOtp) {
            self.dispatch_otp().await?;
        }
        Ok(())
    }

    async fn dispatch_otp(&mut self) -> Result<()> {
        let auth_token = match self.auth_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("no auth token stored, OTP not requested");
                self.step(Event::OtpDispatchFailed(FailureReason::SessionExpired))?;
                return Err(PaymentError::SessionExpired);
            }
            Err(err) => {
                self.step(Event::OtpDispatchFailed(FailureReason::NetworkError))?;
                return Err(err);
            }
        };

        info!("requesting OTP");
        match self.service.request_otp(&auth_token).await {
            Ok(()) => {
                self.step(Event::OtpDispatched)?;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "OTP request failed");
                self.step(Event::OtpDispatchFailed(FailureReason::NetworkError))?;
                Err(PaymentError::NetworkError(err.to_string()))
            }
        }
    }

    /// Submits the payment with `code`.
    ///
    /// A refused or failed submission returns the session to OTP entry with
    /// payee, amount and idempotency token unchanged, so the caller may try
    /// again or cancel.
    pub async fn submit_otp(&mut self, code: &str) -> Result<PaymentOutcome> {
        let effects = self.step(Event::SubmitOtp(code.to_string()))?;
        let Some(Effect::SubmitPayment(request)) = effects.into_iter().next() else {
            return Err(PaymentError::InvalidTransition {
                state: self.state().name().to_string(),
                action: "submit OTP",
            });
        };
        self.submit(request).await
    }

    async fn submit(&mut self, request: PaymentRequest) -> Result<PaymentOutcome> {
        let auth_token = match self.auth_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("no auth token stored, payment not submitted");
                self.step(Event::SubmissionFailed)?;
                return Err(PaymentError::SessionExpired);
            }
            Err(err) => {
                self.step(Event::SubmissionFailed)?;
                return Err(err);
            }
        };

        info!(
            payee = %request.payee_id,
            amount = %request.amount,
            token = %request.idempotency_token,
            "submitting payment"
        );
        match self.service.submit_payment(&auth_token, &request).await {
            Ok(receipt) => {
                self.step(Event::SubmissionAccepted(receipt))?;
                match self.state() {
                    State::Succeeded { balance_after } => Ok(PaymentOutcome::Succeeded {
                        balance_after: *balance_after,
                    }),
                    State::Blocked {
                        reason,
                        balance_after,
                    } => {
                        warn!(%reason, "payment flagged as suspicious");
                        Ok(PaymentOutcome::Blocked {
                            reason: reason.clone(),
                            balance_after: *balance_after,
                        })
                    }
                    other => Err(PaymentError::InvalidTransition {
                        state: other.name().to_string(),
                        action: "complete submission",
                    }),
                }
            }
            Err(err) => {
                warn!(%err, "payment submission failed");
                self.step(Event::SubmissionFailed)?;
                Err(err.into())
            }
        }
    }

    /// Abandons the session. A submission already sent cannot be recalled.
    pub fn cancel(&mut self) -> Result<()> {
        self.step(Event::Cancel)?;
        Ok(())
    }
}
