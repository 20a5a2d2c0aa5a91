//! Volley CLI - fire/detonation conformance runs and capture file tools.

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

use commands::{fields, inspect, record, resolve, run};

#[derive(Parser)]
#[command(name = "volley")]
#[command(about = "Fire/detonation conformance validator and capture tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decoder tree of a data type
    Resolve {
        /// Data type name
        type_name: String,
        /// FOM module file; repeat for several, searched in order
        #[arg(long = "fom", required = true)]
        foms: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the fields of a class with their declared and resolved types
    Fields {
        /// Class name
        class: String,
        /// FOM module file; repeat for several, searched in order
        #[arg(long = "fom", required = true)]
        foms: Vec<String>,
        /// Look up an object class instead of an interaction class
        #[arg(long)]
        object: bool,
        /// Output the class definition as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the conformance test against a recorded capture
    Run {
        /// Test configuration JSON file
        #[arg(long)]
        config: String,
        /// Test parameters JSON file
        #[arg(long)]
        params: String,
        /// Capture file to replay
        #[arg(long)]
        capture: String,
        /// Replay speed factor (2.0 replays twice as fast)
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Treat a truncated capture tail as end of file
        #[arg(long)]
        permissive: bool,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List records in a capture file
    Inspect {
        /// Path to capture file
        capture: String,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Stop after N records (default: unlimited)
        #[arg(long)]
        max_records: Option<u64>,
        /// Treat a truncated capture tail as end of file
        #[arg(long)]
        permissive: bool,
    },
    /// Append JSON-lines records to a capture file
    Record {
        /// Path to capture file (created if missing)
        capture: String,
        /// JSON-lines input, one record per line (`-` for stdin)
        #[arg(long)]
        from: String,
        /// Discard records already in the capture
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            type_name,
            foms,
            json,
        } => resolve::run(type_name, foms, json),
        Commands::Fields {
            class,
            foms,
            object,
            json,
        } => fields::run(class, foms, object, json),
        Commands::Run {
            config,
            params,
            capture,
            speed,
            permissive,
            json,
        } => run::run(config, params, capture, speed, permissive, json),
        Commands::Inspect {
            capture,
            json,
            max_records,
            permissive,
        } => inspect::run(capture, json, max_records, permissive),
        Commands::Record {
            capture,
            from,
            overwrite,
        } => record::run(capture, from, overwrite),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
