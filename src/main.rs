use anyhow::{Context, Result};
use batch_resizer::app::App;
use batch_resizer::models::{Config, UploadForm};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "batch-resizer")]
#[command(about = "Resize JPEG, PNG and GIF files to an exact width and height")]
struct CliArgs {
    /// Target width in pixels. Read like a form field: non-numeric input is rejected.
    #[arg(long, allow_hyphen_values = true)]
    width: Option<String>,

    /// Target height in pixels.
    #[arg(long, allow_hyphen_values = true)]
    height: Option<String>,

    /// Storage root; overrides UPLOAD_DIR.
    #[arg(long, value_name = "DIR")]
    upload_dir: Option<PathBuf>,

    /// Image files to resize.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

fn upload_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("'{}' has no file name", path.display()))
}

async fn read_form(args: CliArgs) -> Result<UploadForm> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push((upload_name(path)?, bytes));
    }

    Ok(UploadForm {
        width: args.width,
        height: args.height,
        files,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "batch_resizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = CliArgs::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = args.upload_dir.take() {
        config.upload_dir = dir;
    }

    let app = match App::new(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Resizing {} file(s) into {}",
        args.files.len(),
        app.config().upload_dir.display()
    );

    let form = read_form(args).await?;
    let response = app.handle_upload(form).await;
    println!("{}", response.to_json()?);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
