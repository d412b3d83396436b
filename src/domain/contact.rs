use super::payee::UNKNOWN_PAYEE_NAME;
use serde::{Deserialize, Serialize};

/// A contact as handed over by the device: possibly nameless, with any
/// number of phone numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DeviceContact {
    pub name: Option<String>,
    pub phone_numbers: Vec<String>,
}

impl DeviceContact {
    pub fn new<I, S>(name: &str, phone_numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.to_string()),
            phone_numbers: phone_numbers.into_iter().map(Into::into).collect(),
        }
    }
}

/// A device contact reduced to one display name and one phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactEntry {
    pub display_name: String,
    pub phone_number: String,
}

impl ContactEntry {
    /// Reduces a device contact: first number wins, whitespace is stripped
    /// from it. Contacts without a usable number yield `None`.
    pub fn from_device(contact: &DeviceContact) -> Option<Self> {
        let phone_number: String = contact
            .phone_numbers
            .first()?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if phone_number.is_empty() {
            return None;
        }
        let display_name = contact
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_PAYEE_NAME)
            .to_string();
        Some(Self {
            display_name,
            phone_number,
        })
    }

    fn matches(&self, needle: &str) -> bool {
        self.display_name.to_lowercase().contains(needle)
            || self.phone_number.to_lowercase().contains(needle)
    }
}

/// All entries whose name starts with `letter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBucket {
    pub letter: char,
    pub entries: Vec<ContactEntry>,
}

/// Contacts grouped under A-Z headers. Only non-empty buckets are kept, in
/// alphabetical order; entries are sorted by name, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactIndex {
    buckets: Vec<ContactBucket>,
}

impl ContactIndex {
    pub fn build(raw_contacts: &[DeviceContact]) -> Self {
        let mut entries: Vec<ContactEntry> = raw_contacts
            .iter()
            .filter_map(ContactEntry::from_device)
            .collect();
        entries.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.display_name.cmp(&b.display_name))
        });

        let buckets = ('A'..='Z')
            .filter_map(|letter| {
                let bucket: Vec<ContactEntry> = entries
                    .iter()
                    .filter(|entry| entry.display_name.to_uppercase().starts_with(letter))
                    .cloned()
                    .collect();
                (!bucket.is_empty()).then_some(ContactBucket {
                    letter,
                    entries: bucket,
                })
            })
            .collect();

        Self { buckets }
    }

    /// Filters entries by a case-insensitive substring of name or number.
    /// An empty query returns the index unchanged.
    pub fn search(&self, query: &str) -> Self {
        if query.is_empty() {
            return self.clone();
        }
        let needle = query.to_lowercase();
        let buckets = self
            .buckets
            .iter()
            .filter_map(|bucket| {
                let entries: Vec<ContactEntry> = bucket
                    .entries
                    .iter()
                    .filter(|entry| entry.matches(&needle))
                    .cloned()
                    .collect();
                (!entries.is_empty()).then_some(ContactBucket {
                    letter: bucket.letter,
                    entries,
                })
            })
            .collect();
        Self { buckets }
    }

    /// Position of the bucket headed by `letter`, for jumping a list view.
    pub fn locate_bucket(&self, letter: char) -> Option<usize> {
        let letter = letter.to_ascii_uppercase();
        self.buckets.iter().position(|bucket| bucket.letter == letter)
    }

    pub fn buckets(&self) -> &[ContactBucket] {
        &self.buckets
    }

    pub fn entries(&self) -> impl Iterator<Item = &ContactEntry> {
        self.buckets.iter().flat_map(|bucket| bucket.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
