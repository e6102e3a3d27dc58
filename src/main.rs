// src/main.rs
mod config;
mod extractors;
mod sanmartin;
mod storage;
mod utils;

use std::path::PathBuf;

use clap::Parser;

use config::ExtractorConfig;
use extractors::timetable::TimetableExtractor;
use sanmartin::client;
use sanmartin::document::TimetableDocument;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the San Martín timetable extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the published timetable PDF
    #[arg(long, default_value = client::DEFAULT_TIMETABLE_URL)]
    url: String,

    /// Local PDF file to process instead of downloading
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the generated record files
    #[arg(short, long, default_value = "./data")]
    output_dir: String,

    /// Page mapping and station list (JSON); defaults to the San Martín line
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug mode - dump the raw text of every page next to the output
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting extraction for args: {:?}", args);

    // 3. Load configuration (page→service mapping + station sequence)
    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            ExtractorConfig::from_file(path)?
        }
        None => ExtractorConfig::san_martin(),
    };

    // 4. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 5. Acquire the PDF: local file, or download and keep a copy
    let (pdf_bytes, source) = match &args.input {
        Some(path) => {
            tracing::info!("Reading local PDF: {}", path.display());
            (std::fs::read(path)?, path.display().to_string())
        }
        None => {
            let bytes = client::download_timetable_pdf(&args.url).await?;
            tracing::info!("Downloaded timetable PDF ({} bytes)", bytes.len());
            storage.save_source_pdf(&bytes)?;
            (bytes, args.url.clone())
        }
    };

    // 6. Open the document; an unreadable PDF is the only fatal case from
    //    here on
    let document = TimetableDocument::from_bytes(&pdf_bytes)?;
    tracing::info!("Document loaded: {} pages", document.page_count());

    if args.debug {
        for index in 0..document.page_count() {
            if let Some(text) = document.page_text(index) {
                let path = storage.save_page_text(index, &text)?;
                tracing::info!("Dumped page {} text to {}", index, path.display());
            }
        }
    }

    // 7. Run the extraction pipeline over all pages
    let extractor = TimetableExtractor::new(config);
    let extraction = extractor.extract(&document);

    // 8. Save both directional record sets (empty directions produce no file)
    for set in extraction.record_sets() {
        match storage.save_record_set(set) {
            Ok(Some(path)) => {
                tracing::info!("Generated: {} ({} records)", path.display(), set.len())
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to save records for '{}': {}", set.direction, e),
        }
    }

    // 9. Save the run summary so dropped rows and skipped pages stay visible
    storage.save_run_summary(&source, &extraction.stats)?;

    let stats = &extraction.stats;
    tracing::info!(
        "Extraction finished. Pages: {} processed, {} skipped, {} without text. Rows: {} accepted, {} dropped",
        stats.pages_processed,
        stats.pages_skipped,
        stats.pages_empty,
        stats.rows_accepted,
        stats.rows_dropped
    );
    if stats.rows_accepted == 0 {
        tracing::warn!("No timetable rows extracted - the PDF layout may have changed");
    }

    Ok(())
}
