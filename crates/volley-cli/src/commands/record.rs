//! Record command implementation.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing::info;
use volley_capture::{CaptureRecord, CaptureWriter, WriteOptions};

pub fn run(capture: String, from: String, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    let input: Box<dyn BufRead> = if from == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&from).map_err(|e| format!("Failed to open {}: {}", from, e))?;
        Box::new(BufReader::new(file))
    };

    // Parse everything first so a bad line leaves the capture untouched.
    let mut records = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: CaptureRecord = serde_json::from_str(&line)
            .map_err(|e| format!("{} line {}: {}", from, index + 1, e))?;
        records.push(record);
    }

    let options = WriteOptions {
        append: !overwrite,
        ..WriteOptions::default()
    };
    let mut writer = CaptureWriter::open(&capture, options)
        .map_err(|e| format!("Failed to open capture file: {}: {}", capture, e))?;
    for record in &records {
        writer.append(record)?;
    }
    writer.finish()?;

    info!(records = records.len(), capture = %capture, "records appended");
    println!("Recorded {} records to {}", records.len(), capture);
    Ok(())
}
