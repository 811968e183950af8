//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Everything that touches the outside world (local storage, downloads,
//! GitHub, the background worker) happens in the side-effect pass that
//! follows each `update`.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Focus, GitHubFields, Model, Notice, NoticeLevel};
pub use update::{Message, update};

use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use anyhow::{Context, Result};
use tracing::info;

use crate::document::{DEFAULT_FILENAME, Document, FileType};
use crate::export::{DownloadDir, Exporter};
use crate::github::{DEFAULT_API_BASE, GitHubClient};
use crate::storage::{EDITOR_CONTENT_KEY, LocalStore};
use crate::worker::{
    self, AssetManifest, BackgroundWorker, HttpFetcher, PageMessage, WorkerEvent, WorkerHandle,
};

/// Everything the application needs to start, resolved from config and CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub api_base: String,
    pub filename: String,
    pub filetype: FileType,
    pub github: GitHubFields,
    pub manifest: AssetManifest,
    /// Register the asset cache on start. Needs an origin in the manifest.
    pub register_assets: bool,
    /// Files to open on launch, relayed through the worker.
    pub launch_files: Vec<PathBuf>,
}

impl Settings {
    pub fn new(data_dir: impl Into<PathBuf>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            download_dir: download_dir.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            filetype: FileType::default(),
            github: GitHubFields::default(),
            manifest: AssetManifest::default(),
            register_assets: false,
            launch_files: Vec::new(),
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }
}

/// Main application struct: owns the services the side effects talk to.
pub struct App {
    settings: Settings,
    store: LocalStore,
    exporter: Exporter<DownloadDir>,
    github: GitHubClient,
    worker: WorkerHandle,
    page: Receiver<PageMessage>,
    persisted_revision: u64,
}

impl App {
    /// Open local storage, build the HTTP clients and start the worker.
    ///
    /// # Errors
    /// Returns an error if an HTTP client or the worker thread cannot be
    /// created.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = LocalStore::open(&settings.data_dir);
        let exporter = Exporter::new(DownloadDir::new(&settings.download_dir));
        let github = GitHubClient::new(settings.api_base.clone())
            .context("Failed to create GitHub client")?;

        let fetcher = HttpFetcher::new().context("Failed to create HTTP client")?;
        let background =
            BackgroundWorker::new(settings.manifest.clone(), settings.cache_dir(), fetcher);
        let worker = worker::spawn(background).context("Failed to start background worker")?;
        let (_, page) = worker.connect_page();

        if settings.register_assets {
            worker.send(WorkerEvent::Register);
        }
        for path in &settings.launch_files {
            info!(path = %path.display(), "opening launch file");
            worker.open_file(path.clone());
        }

        Ok(Self {
            settings,
            store,
            exporter,
            github,
            worker,
            page,
            persisted_revision: 0,
        })
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the first model: persisted editor content plus configured fields.
    pub fn initial_model(&self, size: (u16, u16)) -> Model {
        let text = self.store.get(EDITOR_CONTENT_KEY).unwrap_or_default();
        let mut document = Document::new(text);
        document.filename.clone_from(&self.settings.filename);
        document.filetype = self.settings.filetype;
        Model::new(document, size).with_github(self.settings.github.clone())
    }

    /// Messages the worker has posted to this page since the last call.
    fn drain_page_messages(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Ok(PageMessage::FileOpen { content, name }) = self.page.try_recv() {
            messages.push(Message::FileOpened { content, name });
        }
        messages
    }

    /// Stop the worker, waiting for queued events to finish.
    pub fn shutdown(self) {
        self.worker.shutdown();
    }
}
