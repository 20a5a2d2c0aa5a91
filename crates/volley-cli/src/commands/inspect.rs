//! Inspect command implementation.

use crate::output::{self, Column};
use volley_capture::CaptureReader;

const COLUMNS: [Column; 3] = [("AT_MS", 10), ("RECORD", 22), ("SUMMARY", 0)];

pub fn run(
    capture: String,
    json: bool,
    max_records: Option<u64>,
    permissive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = CaptureReader::open(&capture, super::read_mode(permissive))
        .map_err(|e| format!("Failed to open capture file: {}: {}", capture, e))?;

    if !json {
        output::print_table_header(&COLUMNS);
    }

    let mut count: u64 = 0;
    while let Some(record) = reader.read_record()? {
        if max_records.is_some_and(|max| count >= max) {
            break;
        }
        if json {
            println!("{}", serde_json::to_string(&record)?);
        } else {
            let cells = [
                record.at_ms().to_string(),
                record.kind().to_string(),
                record.to_string(),
            ];
            println!("{}", output::format_table_row(&COLUMNS, &cells));
        }
        count += 1;
    }

    Ok(())
}
