//! Run command implementation.

use crate::output::{self, Column};
use std::sync::Arc;
use tracing::{debug, info};
use volley_capture::{CaptureReader, ReplayFederation, Replayer};
use volley_core::{
    EngineError, EventAudit, FederateAmbassador, RunReport, TestConfig, TestParams, VerdictEngine,
};
use volley_schema::{SchemaSource, TypeResolver, XmlSchemaSource};

const STAGE_COLUMNS: [Column; 3] = [("STAGE", 18), ("STATUS", 14), ("ELAPSED_MS", 0)];
const AUDIT_COLUMNS: [Column; 4] = [("EVENT", 28), ("RECEIVED_MS", 15), ("DECODED", 8), ("PROBLEMS", 0)];

pub fn run(
    config: String,
    params: String,
    capture: String,
    speed: f64,
    permissive: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = TestConfig::load(&config)?;
    let params = TestParams::load(&params)?;
    let records = CaptureReader::open(&capture, super::read_mode(permissive))
        .map_err(|e| format!("Failed to open capture file: {}: {}", capture, e))?
        .read_all()?;
    info!(records = records.len(), capture = %capture, "capture loaded");

    let (ambassador, queue) = FederateAmbassador::new();
    let federation = Arc::new(ReplayFederation::new(ambassador.clone()));
    let replayer = Replayer::new(records, ambassador.clone(), federation.clone()).with_speed(speed)?;

    let urls = params.url_strings();
    let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    let report = match XmlSchemaSource.load(&urls) {
        Err(e) => RunReport::setup_failure(format!("cannot load FOM modules: {}", e)),
        Ok(documents) => {
            let resolver = TypeResolver::new(documents);
            match VerdictEngine::new(config, params, resolver, ambassador, queue, federation) {
                Ok(engine) => {
                    // Delivery can outlive the verdict; the thread is left detached.
                    let _replay = replayer.spawn();
                    engine.run()
                }
                Err(EngineError::Config(e)) => return Err(e.into()),
                Err(EngineError::Setup(reason)) => RunReport::setup_failure(reason),
            }
        }
    };

    if json {
        println!("{}", output::format_json(&report));
    } else {
        print_report(&report);
    }

    if !report.verdict.is_pass() {
        debug!(code = report.verdict.exit_code(), "exiting with verdict code");
        std::process::exit(report.verdict.exit_code());
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    output::print_table_header(&STAGE_COLUMNS);
    for stage in &report.stages {
        let cells = [
            stage.stage.to_string(),
            format!("{:?}", stage.status).to_lowercase(),
            stage.elapsed_ms.to_string(),
        ];
        println!("{}", output::format_table_row(&STAGE_COLUMNS, &cells));
    }

    for (class, events) in &report.audit {
        println!();
        println!("{} ({} events)", class, events.len());
        output::print_table_header(&AUDIT_COLUMNS);
        for event in events {
            let cells = [
                event.event.to_string(),
                event.received_at_ms.map_or_else(|| "-".to_string(), |ms| ms.to_string()),
                event.decoded.len().to_string(),
                problems(event),
            ];
            println!("{}", output::format_table_row(&AUDIT_COLUMNS, &cells));
        }
    }

    println!();
    println!("VERDICT: {}", report.verdict);
}

fn problems(event: &EventAudit) -> String {
    let mut parts: Vec<String> = event
        .failed
        .iter()
        .map(|(field, reason)| format!("failed {} ({})", field, reason))
        .collect();
    parts.extend(event.missing.iter().map(|field| format!("missing {}", field)));
    parts.extend(
        event
            .optional_missing
            .iter()
            .map(|field| format!("optional {}", field)),
    );
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join("; ")
    }
}
