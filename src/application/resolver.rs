use crate::domain::contact::{ContactEntry, ContactIndex};
use crate::domain::payee::{self, PayeeDescriptor};
use crate::domain::ports::ContactSourceBox;
use crate::error::Result;
use tracing::{debug, warn};

/// Resolves who to pay, from a scanned deep link or the address book.
pub struct PayeeResolver {
    contacts: ContactSourceBox,
}

impl PayeeResolver {
    pub fn new(contacts: ContactSourceBox) -> Self {
        Self { contacts }
    }

    /// Decodes the payload of a scanned QR code.
    pub fn resolve_qr(&self, uri: &str) -> Result<PayeeDescriptor> {
        payee::decode_qr(uri)
            .inspect(|payee| debug!(payee = %payee, "QR resolved"))
            .map_err(|err| {
                warn!(%err, "rejected QR payload");
                err.into()
            })
    }

    /// Loads the address book and indexes it under A-Z headers.
    pub async fn contact_index(&self) -> Result<ContactIndex> {
        let raw = self.contacts.contacts().await?;
        let index = ContactIndex::build(&raw);
        debug!(
            contacts = raw.len(),
            indexed = index.len(),
            buckets = index.buckets().len(),
            "contact index built"
        );
        Ok(index)
    }

    /// Turns a tapped contact into a payee addressed by phone number.
    pub fn select_contact(&self, entry: &ContactEntry) -> Result<PayeeDescriptor> {
        PayeeDescriptor::from_contact(&entry.display_name, &entry.phone_number)
    }
}
