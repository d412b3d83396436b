use crate::error::{PaymentError, QrError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Literal prefix every scanned payment link must start with.
pub const UPI_PAY_PREFIX: &str = "upi://pay";
/// Scheme of a UPI payment deep link.
pub const UPI_SCHEME: &str = "upi";
/// Host (action) of a UPI payment deep link, as in `upi://pay?...`.
pub const UPI_PAY_HOST: &str = "pay";
/// Domain appended to a phone number to form a payee address.
pub const SYNTHETIC_VPA_DOMAIN: &str = "ybl";
/// Display name used when a link or contact carries none.
pub const UNKNOWN_PAYEE_NAME: &str = "Unknown";

/// Where a payee came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayeeSource {
    Qr,
    Contact,
    Manual,
}

/// Canonical recipient of a payment, regardless of how it was chosen.
///
/// The `id` is a payee address (`name@bank`) and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeDescriptor {
    pub id: String,
    pub display_name: String,
    pub source: PayeeSource,
}

impl PayeeDescriptor {
    fn new(id: String, display_name: String, source: PayeeSource) -> Result<Self> {
        if id.is_empty() {
            return Err(PaymentError::MissingPayeeAddress);
        }
        let display_name = if display_name.is_empty() {
            UNKNOWN_PAYEE_NAME.to_string()
        } else {
            display_name
        };
        Ok(Self {
            id,
            display_name,
            source,
        })
    }

    /// A payee typed in by hand.
    pub fn manual(id: impl Into<String>, display_name: impl Into<String>) -> Result<Self> {
        Self::new(
            id.into().trim().to_string(),
            display_name.into(),
            PayeeSource::Manual,
        )
    }

    /// A payee picked from the contact list, addressed by the synthetic
    /// phone-number address.
    pub fn from_contact(display_name: &str, phone_number: &str) -> Result<Self> {
        let vpa = normalize_phone_to_vpa(phone_number);
        if vpa.len() == SYNTHETIC_VPA_DOMAIN.len() + 1 {
            // nothing but the suffix: the number had no digits
            return Err(PaymentError::MissingPayeeAddress);
        }
        Self::new(vpa, display_name.to_string(), PayeeSource::Contact)
    }
}

impl fmt::Display for PayeeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name, self.id)
    }
}

/// The raw text must begin with `upi://pay`, case included, followed by
/// nothing, a query, a fragment or a slash.
fn has_pay_prefix(uri: &str) -> bool {
    uri.strip_prefix(UPI_PAY_PREFIX)
        .is_some_and(|rest| matches!(rest.chars().next(), None | Some('?' | '/' | '#')))
}

/// Decodes a scanned `upi://pay?pa=<address>&pn=<name>` deep link.
///
/// Only `pa` (mandatory) and `pn` (optional, defaults to `"Unknown"`) are
/// read; every other parameter is ignored. Any string is accepted as input
/// and either yields a descriptor or a [`QrError`].
pub fn decode_qr(uri: &str) -> std::result::Result<PayeeDescriptor, QrError> {
    if !has_pay_prefix(uri) {
        return Err(QrError::NotUpiScheme);
    }
    let url = Url::parse(uri).map_err(|_| QrError::NotUpiScheme)?;
    if url.scheme() != UPI_SCHEME
        || url.host_str() != Some(UPI_PAY_HOST)
        || !url.username().is_empty()
        || url.port().is_some()
        || !matches!(url.path(), "" | "/")
    {
        return Err(QrError::NotUpiScheme);
    }

    let mut address = None;
    let mut name = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "pa" if address.is_none() => address = Some(value.into_owned()),
            "pn" if name.is_none() => name = Some(value.into_owned()),
            _ => {}
        }
    }

    let id = address
        .filter(|pa| !pa.is_empty())
        .ok_or(QrError::MissingPayeeAddress)?;
    let display_name = name
        .filter(|pn| !pn.is_empty())
        .unwrap_or_else(|| UNKNOWN_PAYEE_NAME.to_string());

    Ok(PayeeDescriptor {
        id,
        display_name,
        source: PayeeSource::Qr,
    })
}

/// Turns a phone number into a payee address by keeping its digits and
/// appending the synthetic domain. Idempotent on its own output.
pub fn normalize_phone_to_vpa(phone_number: &str) -> String {
    let digits: String = phone_number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    format!("{digits}@{SYNTHETIC_VPA_DOMAIN}")
}
