use crate::domain::contact::DeviceContact;
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

/// Separator between numbers in the `phone_numbers` column.
pub const PHONE_SEPARATOR: char = ';';

#[derive(Debug, Deserialize)]
struct ContactRecord {
    name: Option<String>,
    phone_numbers: Option<String>,
}

impl From<ContactRecord> for DeviceContact {
    fn from(record: ContactRecord) -> Self {
        let phone_numbers = record
            .phone_numbers
            .unwrap_or_default()
            .split(PHONE_SEPARATOR)
            .map(str::trim)
            .filter(|number| !number.is_empty())
            .map(str::to_string)
            .collect();
        DeviceContact {
            name: record.name.filter(|name| !name.is_empty()),
            phone_numbers,
        }
    }
}

/// Reads an address-book export with a `name,phone_numbers` header.
///
/// Multiple numbers share one column, separated by `;`. Fields are trimmed
/// and short rows are accepted.
pub struct ContactReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ContactReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one contact per row.
    pub fn contacts(self) -> impl Iterator<Item = Result<DeviceContact>> {
        self.reader
            .into_deserialize::<ContactRecord>()
            .map(|result| result.map(DeviceContact::from).map_err(PaymentError::from))
    }
}
