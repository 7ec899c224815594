use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mediagate::media::{classify, read_duration, MediaKind};
use mediagate::models::{UploadRequirements, UploadedFile};
use mediagate::pipeline::UploadPipeline;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mediagate")]
#[command(about = "Validate, normalize and store media uploads")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify, convert and store files.
    Upload {
        /// Folder under the storage root to store into.
        #[arg(long)]
        folder: String,

        /// Accepted media kinds (image, video). Defaults to both.
        #[arg(long, value_delimiter = ',', value_parser = parse_kind_arg)]
        accept: Vec<MediaKind>,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the detected kind and duration of files without storing them.
    Probe {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_kind_arg(input: &str) -> std::result::Result<MediaKind, String> {
    match input.parse::<MediaKind>() {
        Ok(MediaKind::Unknown) | Err(_) => Err(format!(
            "Invalid media kind '{}'. Expected image or video",
            input
        )),
        Ok(kind) => Ok(kind),
    }
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    paths
        .iter()
        .enumerate()
        .map(|(id, path)| {
            let data =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            Ok(UploadedFile::new(display_name(path), data, id))
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn probe(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let line = match classify(&data) {
            Ok(MediaKind::Video) => match read_duration(&data) {
                Ok(seconds) => format!("video\t{}s", seconds),
                Err(e) => format!("video\tduration unavailable: {}", e),
            },
            Ok(kind) => kind.to_string(),
            Err(e) => format!("unknown\t{}", e),
        };
        println!("{}\t{}", path.display(), line);
    }
    Ok(())
}

async fn upload(folder: String, accept: Vec<MediaKind>, paths: &[PathBuf]) -> Result<()> {
    let pipeline = UploadPipeline::new().await?;

    let mut requirements = UploadRequirements::new(folder);
    if !accept.is_empty() {
        requirements = requirements.with_media_kinds(accept);
    }

    let files = read_uploads(paths)?;
    let stored = pipeline.handle_files(&files, &requirements).await?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediagate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let result = match args.command {
        Command::Upload {
            folder,
            accept,
            files,
        } => {
            info!("Uploading {} file(s) into '{}'", files.len(), folder);
            upload(folder, accept, &files).await
        }
        Command::Probe { files } => probe(&files),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast_ref::<mediagate::Error>() {
                Some(inner) if inner.is_user_error() => error!("Rejected upload: {}", inner),
                _ => error!("Command failed: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}
