//! Command-line interface for fetching and extracting toolchain archives.
//!
//! This CLI tool downloads files with URL fallbacks, extracts archives in
//! place, lists archive contents and installs premake for the engine setup.

mod premake;
mod progress;

use clap::{Parser, Subcommand};
use fetchkit::{ExtractOptions, ExtractOutcome, FetchSource, Fetcher};
use premake::{PremakeConfig, PremakeStatus, DEFAULT_PREMAKE_VERSION};
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "fetchkit")]
#[command(version, about = "Fetch and unpack toolchain archives", long_about = None)]
struct Cli {
    /// Print progress as plain text lines on stdout instead of a bar
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a file, trying each URL in order until one succeeds
    Fetch {
        /// Candidate URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Destination file
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Extract an archive beside itself
    Extract {
        /// Archive file to extract (.zip, .gz or .xz)
        archive: PathBuf,

        /// Keep the archive after extraction
        #[arg(long)]
        keep: bool,

        /// Print extraction statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List archive entries
    Probe {
        /// Archive file to probe
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Make sure premake is installed, downloading it if allowed
    Premake {
        /// Premake release version
        #[arg(long, default_value = DEFAULT_PREMAKE_VERSION)]
        version: String,

        /// Install directory [default: Thirdparty/premake/bin/<system>]
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Download premake without asking when it is missing
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch { urls, out } => handle_fetch(urls, out, cli.plain),
        Commands::Extract {
            archive,
            keep,
            json,
        } => handle_extract(archive, keep, json, cli.plain),
        Commands::Probe { archive, json } => handle_probe(archive, json),
        Commands::Premake { version, dir, yes } => handle_premake(version, dir, yes, cli.plain),
    };

    match result {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn handle_fetch(urls: Vec<String>, out: PathBuf, plain: bool) -> Result<i32, Box<dyn Error>> {
    let source = match <[String; 1]>::try_from(urls) {
        Ok([url]) => FetchSource::Single(url),
        Err(urls) => FetchSource::Candidates(urls),
    };

    let mut sink = progress::sink(plain);
    let path = Fetcher::new()?.fetch(&source, &out, &mut *sink)?;

    println!("Downloaded {}", path.display());
    Ok(0)
}

fn handle_extract(
    archive: PathBuf,
    keep: bool,
    json: bool,
    plain: bool,
) -> Result<i32, Box<dyn Error>> {
    let options = ExtractOptions {
        delete_archive: !keep,
    };

    let mut sink = progress::sink(plain);
    match fetchkit::extract(&archive, &options, &mut *sink)? {
        ExtractOutcome::Extracted(stats) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "Extracted {} entries ({} bytes), skipped {} in {:.2}s",
                    stats.entries_extracted,
                    stats.bytes_extracted,
                    stats.entries_skipped,
                    stats.duration.as_secs_f64()
                );
            }
            Ok(0)
        }
        ExtractOutcome::Unsupported { extension } => {
            eprintln!("Unsupported file type: {}", extension);
            Ok(2)
        }
    }
}

fn handle_probe(archive: PathBuf, json: bool) -> Result<i32, Box<dyn Error>> {
    let info = fetchkit::probe(&archive)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(0);
    }

    println!("Format: {}", info.format);
    for entry in &info.entries {
        let kind = if entry.is_file { ' ' } else { 'd' };
        println!("{} {:>12}  {}", kind, entry.size, entry.name);
    }
    println!(
        "{} entries, {} bytes to extract",
        info.entries.len(),
        info.total_size
    );
    Ok(0)
}

fn handle_premake(
    version: String,
    dir: Option<PathBuf>,
    yes: bool,
    plain: bool,
) -> Result<i32, Box<dyn Error>> {
    let config = PremakeConfig::for_host(&version, dir);
    let fetcher = Fetcher::new()?;
    let mut sink = progress::sink(plain);

    match premake::ensure_premake(&config, yes, &fetcher, &mut *sink)? {
        PremakeStatus::Present(path) | PremakeStatus::Installed(path) => {
            println!("Premake {} ready at {}", config.version, path.display());
            Ok(0)
        }
        PremakeStatus::Missing => {
            eprintln!(
                "Premake {} not found in {}. Re-run with --yes to download it.",
                config.version,
                config.directory.display()
            );
            Ok(1)
        }
    }
}
