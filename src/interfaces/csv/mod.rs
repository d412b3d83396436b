//! CSV import of device contact exports and export of contact indexes.

pub mod contact_reader;
pub mod contact_writer;
