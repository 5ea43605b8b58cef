use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gallery_core::{
    FallbackImages, GalleryStore, ImageFile, ImageTable, MemoryImageTable, RestImageTable,
    TracingNotifier, UploadMeta,
};
use shared::domain::{ImageId, ImagePatch, ImageRecord};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

const INLINE_SRC_PREVIEW: usize = 48;

#[derive(Parser, Debug)]
#[command(about = "Manage the clinic gallery images table")]
struct Cli {
    /// Settings file; defaults to ./gallery.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use a process-local table instead of the remote one.
    #[arg(long)]
    offline: bool,
    /// Print images as JSON.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show which chat widget a route embeds.
    Widget { path: String },
    #[command(flatten)]
    Gallery(GalleryCommand),
}

#[derive(Subcommand, Debug)]
enum GalleryCommand {
    /// List gallery images in display order.
    List,
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        #[arg(allow_negative_numbers = true)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// Apply a display order for this session and print the result.
    Reorder {
        #[arg(required = true, allow_negative_numbers = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Widget { path } => {
            match widget_embed::select(&path) {
                Some(widget) => println!("{}", widget.marker()),
                None => println!("no widget for {path}"),
            }
            Ok(())
        }
        Command::Gallery(command) => {
            run_gallery(cli.config.as_deref(), cli.offline, cli.json, command).await
        }
    }
}

async fn run_gallery(
    config_path: Option<&Path>,
    offline: bool,
    as_json: bool,
    command: GalleryCommand,
) -> Result<()> {
    let table: Arc<dyn ImageTable> = if offline {
        info!("using process-local images table");
        Arc::new(MemoryImageTable::new())
    } else {
        let settings = load_settings(config_path);
        let rest_config = settings.rest_config()?;
        info!(table = rest_config.table(), "using remote images table");
        Arc::new(RestImageTable::new(rest_config).context("failed to build table client")?)
    };

    let store =
        GalleryStore::open(table, Arc::new(TracingNotifier), FallbackImages::clinic()).await;

    match command {
        GalleryCommand::List => {}
        GalleryCommand::Upload {
            file,
            title,
            description,
        } => {
            let image = ImageFile::read(&file)
                .await
                .with_context(|| format!("failed to read image '{}'", file.display()))?;
            let meta = UploadMeta {
                title,
                description,
            };
            let added = store.upload(&image, meta).await?;
            println!("added image id={}", added.id);
        }
        GalleryCommand::Update {
            id,
            title,
            description,
        } => {
            store
                .update(ImageId(id), ImagePatch { title, description })
                .await?;
        }
        GalleryCommand::Delete { id } => {
            store.delete(ImageId(id)).await?;
        }
        GalleryCommand::Reorder { ids } => {
            store
                .reorder(ids.into_iter().map(ImageId).collect())
                .await;
        }
    }

    print_images(&store.sorted_images().await, as_json)
}

fn print_images(images: &[ImageRecord], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(images)?);
        return Ok(());
    }

    for image in images {
        println!(
            "{:>5}  {:<28}  {}",
            image.id.0,
            image.title,
            display_src(&image.src)
        );
        if !image.description.is_empty() {
            println!("       {}", image.description);
        }
    }
    Ok(())
}

fn display_src(src: &str) -> String {
    if src.starts_with("data:") && src.len() > INLINE_SRC_PREVIEW {
        let head: String = src.chars().take(INLINE_SRC_PREVIEW).collect();
        format!("{head}... ({} bytes inline)", src.len())
    } else {
        src.to_string()
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
