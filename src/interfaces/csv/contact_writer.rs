use crate::domain::contact::ContactIndex;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct IndexRow<'a> {
    letter: char,
    name: &'a str,
    phone: &'a str,
}

/// Writes a contact index as `letter,name,phone` rows, bucket by bucket.
pub struct ContactIndexWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ContactIndexWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_index(&mut self, index: &ContactIndex) -> Result<()> {
        if index.is_empty() {
            self.writer.write_record(["letter", "name", "phone"])?;
        }
        for bucket in index.buckets() {
            for entry in &bucket.entries {
                self.writer.serialize(IndexRow {
                    letter: bucket.letter,
                    name: &entry.display_name,
                    phone: &entry.phone_number,
                })?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
