#![allow(dead_code)]

use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const HEADER: [&str; 5] = ["payer", "document", "amount", "due_date", "barcode"];

/// Writes `rows` valid boletos with random CPF/CNPJ shapes and amounts.
///
/// Documents encode the row number, so published order can be checked.
pub fn generate_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)?;

    let mut rng = rand::thread_rng();
    for i in 1..=rows {
        let document = if rng.gen_bool(0.5) {
            format!("{:011}", i)
        } else {
            format!("{:014}", i)
        };
        let cents: u32 = rng.gen_range(1..=10_000_000);
        let amount = format!("{}.{:02}", cents / 100, cents % 100);
        let payer = format!("Payer {}", i);
        wtr.write_record([payer.as_str(), &document, &amount, "2099-12-31", ""])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Published JSON lines from the binary's stdout.
pub fn published_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line is not JSON"))
        .collect()
}
