use std::path::PathBuf;
use std::process;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use doc_assembler::errors::Error;
use doc_assembler::model::DocumentRequest;
use doc_assembler::provision::{LockRegistry, NetworkFetcher};
use doc_assembler::{logging, Catalog, Config};

fn main() {
    logging::init_tracing();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match &args.command {
        Command::Validate { request } => {
            let request = read_request(request)?;
            doc_assembler::validation::validate(request)?;
            println!("request is valid");
            Ok(())
        }
        Command::Assemble { request } => {
            let request = read_request(request)?;
            let catalog = Catalog::load(&config.catalog_path, config.catalog_ttl())?;
            let fetcher = NetworkFetcher;
            let locks = LockRegistry::new();
            let now_nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_nanos();

            let document =
                doc_assembler::assemble_document(request, &config, &catalog, &fetcher, &locks, now_nanos)?;

            info!(
                document_key = %document.document_key,
                output = %document.output_path.display(),
                resource_count = document.statuses.len(),
                "assembled document"
            );
            for status in &document.statuses {
                println!("{status:?}");
            }
            println!("wrote {}", document.output_path.display());
            Ok(())
        }
    }
}

fn read_request(path: &PathBuf) -> Result<DocumentRequest, Error> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(Error::from)
}

/// Resolves and assembles a multi-language Bible study document from a
/// JSON request file.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file; falls back to built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Check a request JSON file against the validation rules without
    /// provisioning or assembling anything.
    Validate {
        #[arg(value_name = "REQUEST_JSON")]
        request: PathBuf,
    },
    /// Resolve, provision, parse, and assemble the document described by a
    /// request JSON file.
    Assemble {
        #[arg(value_name = "REQUEST_JSON")]
        request: PathBuf,
    },
}
