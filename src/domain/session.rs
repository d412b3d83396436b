use super::payee::PayeeDescriptor;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Minor units (paise) per rupee.
const MINOR_UNITS_PER_MAJOR: Decimal = dec!(100);

/// A positive payment amount, held in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    pub fn from_minor_units(value: u64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidAmount)
        }
    }

    /// Parses a rupee amount such as `"100"` or `"99.50"`.
    ///
    /// Rejects anything that is not a positive number with at most two
    /// fractional digits.
    pub fn parse(value: &str) -> Result<Self> {
        let major = Decimal::from_str(value.trim()).map_err(|_| PaymentError::InvalidAmount)?;
        if major <= Decimal::ZERO || major.normalize().scale() > 2 {
            return Err(PaymentError::InvalidAmount);
        }
        let minor = major
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|minor| minor.to_u64())
            .ok_or(PaymentError::InvalidAmount)?;
        Self::from_minor_units(minor)
    }

    pub fn minor_units(&self) -> u64 {
        self.0
    }

    /// The amount in rupees.
    pub fn to_major(&self) -> Decimal {
        Decimal::from(self.0) / MINOR_UNITS_PER_MAJOR
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.to_major())
    }
}

/// Account balance as reported by the payment service, in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn debit(self, amount: Amount) -> Self {
        Self(self.0 - amount.to_major())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

/// Opaque token attached to a submission so that the service can collapse
/// retries. Fixed for the lifetime of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyToken(Uuid);

impl IdempotencyToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    #[default]
    Unset,
    Verified,
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NetworkError,
    SessionExpired,
}

/// Authorization progress of a payment session.
///
/// `Succeeded`, `Failed`, `Blocked` and `Cancelled` are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum State {
    AmountPending,
    PinRequired,
    /// `otp_sent` stays false while the dispatch call is outstanding.
    OtpPending {
        otp_sent: bool,
    },
    Submitting,
    Succeeded {
        balance_after: Balance,
    },
    Failed {
        reason: FailureReason,
    },
    Blocked {
        reason: String,
        balance_after: Balance,
    },
    Cancelled,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Succeeded { .. } | State::Failed { .. } | State::Blocked { .. } | State::Cancelled
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            State::AmountPending => "amount_pending",
            State::PinRequired => "pin_required",
            State::OtpPending { otp_sent: false } => "dispatching_otp",
            State::OtpPending { otp_sent: true } => "otp_pending",
            State::Submitting => "submitting",
            State::Succeeded { .. } => "succeeded",
            State::Failed { .. } => "failed",
            State::Blocked { .. } => "blocked",
            State::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One payment attempt, from a resolved payee to a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub(crate) payee: PayeeDescriptor,
    pub(crate) amount: Option<Amount>,
    pub(crate) pin_state: PinState,
    pub(crate) otp: Option<String>,
    pub(crate) idempotency_token: IdempotencyToken,
    pub(crate) status: State,
}

impl PaymentSession {
    pub fn new(payee: PayeeDescriptor) -> Self {
        Self {
            payee,
            amount: None,
            pin_state: PinState::Unset,
            otp: None,
            idempotency_token: IdempotencyToken::generate(),
            status: State::AmountPending,
        }
    }

    pub fn payee(&self) -> &PayeeDescriptor {
        &self.payee
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn pin_state(&self) -> PinState {
        self.pin_state
    }

    pub fn idempotency_token(&self) -> IdempotencyToken {
        self.idempotency_token
    }

    pub fn status(&self) -> &State {
        &self.status
    }
}
