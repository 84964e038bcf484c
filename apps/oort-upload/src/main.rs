//! Oort single-file uploader entry point.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use oort_api::HttpClient;
use oort_uploader::{DataFileUploader, UploadContext, UploadStatus};

/// Upload one file into an Arcsecond dataset.
#[derive(Debug, Parser)]
#[command(name = "oort-upload", version)]
struct Args {
    /// File to upload.
    file: PathBuf,

    /// Folder the file was found under; reported in the `root` tag.
    #[arg(long)]
    root: PathBuf,

    /// UUID of an existing dataset.
    #[arg(long, required_unless_present = "dataset_name")]
    dataset_uuid: Option<String>,

    /// Name of a dataset to create.
    #[arg(long)]
    dataset_name: Option<String>,

    /// UUID of the telescope the dataset belongs to.
    #[arg(long)]
    telescope: Option<String>,

    /// Organisation subdomain.
    #[arg(long)]
    org: Option<String>,

    /// Mark the file as raw data.
    #[arg(long, conflicts_with = "not_raw")]
    raw: bool,

    /// Mark the file as reduced data.
    #[arg(long)]
    not_raw: bool,

    /// Extra tag; may be repeated.
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Draw a progress bar while uploading.
    #[arg(long)]
    progress: bool,
}

impl Args {
    fn is_raw(&self) -> Option<bool> {
        match (self.raw, self.not_raw) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    fn context(&self, config: &config::Config) -> UploadContext {
        let mut ctx = UploadContext::new(config.username.as_str());
        if let Some(uuid) = &self.dataset_uuid {
            ctx = ctx.with_dataset_uuid(uuid.as_str());
        }
        if let Some(name) = &self.dataset_name {
            ctx = ctx.with_dataset_name(name.as_str());
        }
        if let Some(telescope) = &self.telescope {
            ctx = ctx.with_telescope(telescope.as_str());
        }
        if let Some(org) = self.org.as_ref().or(config.organisation.as_ref()) {
            ctx = ctx.with_organisation(org.as_str());
        }
        ctx
    }
}

async fn run(args: Args, config: config::Config) -> anyhow::Result<UploadStatus> {
    let mut ctx = args.context(&config);
    ctx.validate()?;

    let client = HttpClient::new(config.api_key.as_deref())?
        .with_base_url(config.base_url.as_str())
        .with_organisation(ctx.organisation_subdomain().map(str::to_string));

    let is_raw = args.is_raw();
    let tags = (!args.tags.is_empty()).then(|| args.tags.clone());
    let uploader = DataFileUploader::new(ctx.into_shared(), Arc::new(client), args.root, args.file)
        .with_display_progress(args.progress);

    let status = uploader.upload_file(is_raw, tags).await;
    if args.progress {
        println!();
    }
    Ok(status?)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::load()?;
    tracing::debug!(username = %config.username, base_url = %config.base_url, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let status = rt.block_on(run(args, config))?;

    println!("{status}");
    Ok(())
}
