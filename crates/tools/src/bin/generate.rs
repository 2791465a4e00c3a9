//!
//! Generate typed client bindings from a protocol description.
//!
//! Usage: `generate <protocol.json> [--output FILE]`

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Generate typed client bindings from a protocol description")]
struct Args {
    /// Path to the protocol description JSON file
    protocol: PathBuf,

    /// Output path for the generated bindings
    #[arg(long = "output", default_value = "bindings.rs")]
    output: PathBuf,
}

fn main() {
    probe_tools::init_logging();

    let args = Args::parse();

    let json = match fs::read_to_string(&args.protocol) {
        Ok(json) => json,
        Err(err) => {
            error!("Failed to read {}: {}", args.protocol.display(), err);
            process::exit(1);
        }
    };

    let domains = match probe_schema::parse_domains(&json) {
        Ok(domains) => domains,
        Err(err) => {
            error!("Failed to parse protocol description: {err}");
            process::exit(1);
        }
    };
    info!("Loaded {} domains", domains.len());

    let source = match probe_codegen::generate(&domains) {
        Ok(source) => source,
        Err(err) => {
            error!("Generation failed: {err}");
            process::exit(1);
        }
    };

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent) {
                error!("Failed to create {}: {}", parent.display(), err);
                process::exit(1);
            }
        }
    }

    if let Err(err) = fs::write(&args.output, source) {
        error!("Failed to write {}: {}", args.output.display(), err);
        process::exit(1);
    }
    info!("Wrote bindings to {}", args.output.display());
}
