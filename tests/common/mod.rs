use grampay::domain::contact::DeviceContact;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub fn generate_contacts_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["name", "phone_numbers"])?;
    for contact in random_contacts(rows) {
        wtr.write_record([
            contact.name.unwrap_or_default(),
            contact.phone_numbers.join(";"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Contacts with random names (mixed case, some without a leading letter)
/// and zero to two phone numbers each.
pub fn random_contacts(count: usize) -> Vec<DeviceContact> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let len = rng.gen_range(1..12);
            let name: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect();
            let numbers = (0..rng.gen_range(0..3))
                .map(|_| format!("{} {}", rng.gen_range(70000..99999), rng.gen_range(10000..99999)))
                .collect::<Vec<_>>();
            DeviceContact {
                name: Some(name),
                phone_numbers: numbers,
            }
        })
        .collect()
}

/// Arbitrary printable ASCII string, biased toward UPI-looking prefixes.
pub fn random_uri(rng: &mut impl Rng) -> String {
    const PREFIXES: [&str; 5] = ["", "upi://pay", "upi://pay?", "upi:", "http://pay?"];
    let prefix = PREFIXES[rng.gen_range(0..PREFIXES.len())];
    let len = rng.gen_range(0..24);
    let tail: String = (0..len)
        .map(|_| char::from(rng.gen_range(0x20u8..0x7f)))
        .collect();
    format!("{prefix}{tail}")
}
