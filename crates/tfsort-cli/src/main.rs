use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tfsort_engine::Ingestor;

/// Sort the top-level blocks of a Terraform or OpenTofu file so every block
/// comes after the blocks it depends on.
#[derive(Parser)]
#[command(name = "tfsort", version, about)]
struct Cli {
    /// Terraform (.tf) or OpenTofu (.tofu) file to sort
    file: PathBuf,

    /// Write the sorted configuration to this path instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Validate the file without writing any output
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let ingestor = Ingestor::new();

    if cli.check {
        if let Err(e) = ingestor.can_ingest(&cli.file) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
        log::info!("{} is sortable", cli.file.display());
        return Ok(());
    }

    let to_stdout = cli.out.is_none();
    let output = cli.out.clone().unwrap_or_default();
    if let Err(e) = ingestor.parse(&cli.file, &output, to_stdout) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    Ok(())
}
