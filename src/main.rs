//! Amnesia Reader
//!
//! Opens a PDF or EPUB, prints its metadata and table of contents, and
//! optionally searches it.
//!
//! Usage: `amnesia-reader <file> [query]`

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use amnesia_reader::{ReaderConfig, ReaderRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amnesia_reader=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ReaderConfig::from_env();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: amnesia-reader <file> [query]");
    };
    let query = args.next();

    tracing::info!("Starting Amnesia Reader v{}", env!("CARGO_PKG_VERSION"));

    let mut reader = ReaderRepository::from_config(config)
        .await
        .context("Failed to initialize progress store")?;

    let book = reader
        .open_book(&path, None)
        .await
        .with_context(|| format!("Failed to open {}", path))?;
    println!("{}", serde_json::to_string_pretty(&book)?);
    println!("\nFormat: {} ({})", book.format, book.format.mime_type());

    println!("\nContents");
    for entry in &book.toc {
        println!("{}{} ({})", "  ".repeat(entry.level + 1), entry.title, entry.page);
    }

    if let Some(saved) = reader.load_progress(&book.id).await? {
        match reader.update_position(saved) {
            Ok(position) => tracing::info!("Resuming at page {}", position.page),
            Err(e) => tracing::warn!("Ignoring saved position: {}", e),
        }
    }

    let position = reader.current_position()?;
    println!(
        "\nPage {}/{}, {:.1}% read, about {} min left",
        position.page,
        position.total_pages,
        reader.calculate_progress(&position)? * 100.0,
        reader.estimate_remaining_time(&position, None)?
    );

    if let Some(query) = query {
        let results = reader.search_text(&query, false).await?;
        println!("\n{} matches for '{}'", results.len(), query);
        for result in &results {
            println!("  p.{} @{}: {}", result.page, result.offset, result.snippet);
        }
    }

    reader.close_book().await?;
    reader.dispose().await;
    Ok(())
}
