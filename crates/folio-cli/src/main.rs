//! Folio CLI: ingest files and manage their variants against the configured
//! database and uploads directory.
//!
//! Reads the same environment as the library (`DATABASE_URL`, `UPLOADS_DIR`,
//! `VARIANT_POLICY`, ...), optionally from a `.env` file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_cli::{build_service, content_type_for, init_tracing, truncate_string};
use folio_core::models::Media;
use folio_core::Config;
use folio_processing::{BatchItem, DemoSeeder, IngestRequest};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "folio", about = "Folio media ingestion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one or more files and generate their variants
    Ingest {
        /// Paths of the files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Uploader user ID
        #[arg(long)]
        uploader: i64,
        /// Folder ID to file the media under
        #[arg(long)]
        folder: Option<i64>,
    },
    /// Seed demo images (no-op for images already present)
    SeedDemo {
        /// Uploader user ID owning the demo media
        #[arg(long, default_value = "1")]
        uploader: i64,
    },
    /// Show the variants recorded for a media
    Variants {
        /// Media ID
        media_id: i64,
    },
    /// List media of an uploader, newest first
    List {
        /// Uploader user ID
        #[arg(long)]
        uploader: i64,
        /// Maximum number of items
        #[arg(long, default_value = "20")]
        limit: i64,
        /// Offset for pagination
        #[arg(long, default_value = "0")]
        offset: i64,
        /// Output format: json or table
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Delete a media, its variants and its files
    Delete {
        /// Media ID
        media_id: i64,
    },
    /// Rebuild a media's variants under the current variant policy
    Regenerate {
        /// Media ID
        media_id: i64,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn print_media_table(items: &[Media], offset: i64) {
    if items.is_empty() {
        println!("\nNo media found.");
        return;
    }

    println!(
        "\n{:>8} {:<36} {:<30} {:<20} {:>12} {:>20}",
        "ID", "UUID", "Filename", "Content Type", "Size (KB)", "Uploaded At"
    );
    println!("{}", "-".repeat(131));

    for media in items {
        println!(
            "{:>8} {:<36} {:<30} {:<20} {:>12.1} {:>20}",
            media.id,
            media.uuid,
            truncate_string(&media.filename, 30),
            truncate_string(&media.mime_type, 20),
            media.size as f64 / 1024.0,
            media.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!(
        "\nShowing {} to {}",
        offset + 1,
        offset + items.len() as i64
    );
}

/// Cancel `token` on Ctrl-C. Variants already being rendered finish; the rest are
/// reported as cancelled.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling remaining work");
            token.cancel();
        }
    });
}

async fn open_batch(
    files: &[PathBuf],
    uploader: i64,
    folder: Option<i64>,
) -> anyhow::Result<Vec<BatchItem>> {
    let mut items = Vec::with_capacity(files.len());
    for path in files {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        let mime_type = content_type_for(&filename);
        let request = IngestRequest::new(filename, mime_type, uploader).with_folder(folder);
        items.push(BatchItem::new(request, file));
    }
    Ok(items)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    let service = build_service(&config).await?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Ingest {
            files,
            uploader,
            folder,
        } => {
            let items = open_batch(&files, uploader, folder).await?;
            let outcome = service.ingest_batch(items, &cancel).await?;
            print_json(&outcome)?;
        }
        Commands::SeedDemo { uploader } => {
            let outcomes = DemoSeeder::new(uploader).seed(&service, &cancel).await?;
            print_json(&outcomes)?;
        }
        Commands::Variants { media_id } => {
            let variants = service.list_variants(media_id).await?;
            print_json(&variants)?;
        }
        Commands::List {
            uploader,
            limit,
            offset,
            format,
        } => {
            let items = service.list_by_uploader(uploader, limit, offset).await?;
            match format.as_str() {
                "json" => print_json(&items)?,
                "table" => print_media_table(&items, offset),
                other => anyhow::bail!("Invalid format '{}'. Must be: json or table", other),
            }
        }
        Commands::Delete { media_id } => {
            service.delete(media_id).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("Media {} deleted", media_id) }),
            )?;
        }
        Commands::Regenerate { media_id } => {
            let outcome = service.regenerate_variants(media_id, &cancel).await?;
            print_json(&outcome)?;
        }
    }

    Ok(())
}
