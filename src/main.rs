//! Textpad - a terminal text editor with PDF export and GitHub upload.
//!
//! # Usage
//!
//! ```bash
//! textpad
//! textpad notes.md
//! textpad --owner octo --repo site --repo-path docs/ --save
//! textpad --asset-origin https://pad.example assets install
//! ```

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use textpad::app::{App, GitHubFields, Settings};
use textpad::config::{
    ConfigFlags, clear_config_flags, default_data_dir, default_download_dir, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use textpad::document::{DEFAULT_FILENAME, FileType};
use textpad::github::DEFAULT_API_BASE;
use textpad::worker::{AssetManifest, BackgroundWorker, HttpFetcher, ServedFrom};

/// A terminal text editor with PDF export and GitHub upload
#[derive(Parser, Debug)]
#[command(name = "textpad", version, about, long_about = None)]
struct Cli {
    /// Files to open, handed to the editor through the background worker
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Filename (without extension) used for downloads and uploads
    #[arg(long, global = true)]
    filename: Option<String>,

    /// Initial export format
    #[arg(long, global = true)]
    filetype: Option<FileType>,

    /// GitHub repository owner
    #[arg(long, global = true)]
    owner: Option<String>,

    /// GitHub repository name
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Directory prefix inside the repository, e.g. `docs/`
    #[arg(long, global = true, value_name = "PREFIX")]
    repo_path: Option<String>,

    /// GitHub access token (defaults to $GITHUB_TOKEN; never saved)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Directory downloads are written to
    #[arg(long, global = true, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Directory for local storage and the asset cache
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, global = true, value_name = "URL")]
    api_base: Option<String>,

    /// Name of the current asset cache generation
    #[arg(long, global = true, value_name = "NAME")]
    cache_name: Option<String>,

    /// Origin the web assets are served from; enables the offline cache
    #[arg(long, global = true, value_name = "URL")]
    asset_origin: Option<String>,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage the offline asset cache
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },
}

#[derive(Subcommand, Debug)]
enum AssetsAction {
    /// Fetch every asset and store it as the current generation
    Install,
    /// Delete every generation except the current one
    Activate,
    /// Fetch a URL cache-first and write the body to stdout
    Fetch { url: Url },
    /// List stored generations and their URLs
    List,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

fn build_settings(cli: &Cli, effective: &ConfigFlags) -> Result<Settings> {
    let data_dir = effective.data_dir.clone().unwrap_or_else(default_data_dir);
    let download_dir = effective
        .download_dir
        .clone()
        .unwrap_or_else(default_download_dir);
    let api_base = effective
        .api_base
        .clone()
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let mut manifest = AssetManifest::default();
    if let Some(name) = &effective.cache_name {
        manifest = manifest.with_generation(name.clone());
    }
    if let Some(host) = Url::parse(&api_base).ok().and_then(|u| u.host_str().map(str::to_owned)) {
        manifest = manifest.with_passthrough_host(host);
    }
    let register_assets = effective.asset_origin.is_some();
    if let Some(origin) = &effective.asset_origin {
        let origin = Url::parse(origin).with_context(|| format!("Invalid asset origin {origin}"))?;
        manifest = manifest.with_origin(origin);
    }

    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .unwrap_or_default();

    let mut settings = Settings::new(data_dir, download_dir);
    settings.api_base = api_base;
    settings.filename = effective
        .filename
        .clone()
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    settings.filetype = effective.filetype.unwrap_or_default();
    settings.github = GitHubFields {
        owner: effective.owner.clone().unwrap_or_default(),
        repo: effective.repo.clone().unwrap_or_default(),
        path: effective.repo_path.clone().unwrap_or_default(),
        token,
    };
    settings.manifest = manifest;
    settings.register_assets = register_assets;
    settings.launch_files.clone_from(&cli.files);
    Ok(settings)
}

fn run_assets(action: &AssetsAction, settings: &Settings) -> Result<()> {
    let fetcher = HttpFetcher::new().context("Failed to create HTTP client")?;
    let worker = BackgroundWorker::new(settings.manifest.clone(), settings.cache_dir(), fetcher);
    let generation = &settings.manifest.generation;

    match action {
        AssetsAction::Install => {
            let count = worker.install().context("Asset install failed")?;
            println!("installed {count} assets into {generation}");
        }
        AssetsAction::Activate => {
            let deleted = worker.activate().context("Asset activation failed")?;
            if deleted.is_empty() {
                println!("{generation} is the only generation");
            }
            for name in deleted {
                println!("deleted {name}");
            }
        }
        AssetsAction::Fetch { url } => {
            let served = worker
                .handle_fetch(url)
                .with_context(|| format!("Failed to fetch {url}"))?;
            let source = match served.from {
                ServedFrom::Cached => "cache",
                ServedFrom::Network => "network",
                ServedFrom::Passthrough => "network (passthrough)",
            };
            eprintln!("{} {} from {source}", served.response.status, url);
            std::io::stdout()
                .write_all(&served.response.body)
                .context("Failed to write response body")?;
        }
        AssetsAction::List => {
            let storage = worker.storage();
            for name in storage.keys()? {
                let marker = if &name == generation { '*' } else { ' ' };
                println!("{marker} {name}");
                for url in storage.open(&name)?.urls()? {
                    println!("    {url}");
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.log_file.as_ref())?;
    let settings = build_settings(&cli, &effective)?;

    if let Some(Command::Assets { action }) = &cli.command {
        return run_assets(action, &settings);
    }

    for file in &settings.launch_files {
        if !file.exists() {
            anyhow::bail!("File not found: {}", file.display());
        }
    }

    let mut app = App::new(settings)?;
    let result = app.run().context("Application error");
    app.shutdown();
    result
}
