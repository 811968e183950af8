//! The background worker: offline asset cache and file-open relay.
//!
//! The worker runs on its own thread and is driven by [`WorkerEvent`]s. It
//! never shares state with the editor except through the [`Clients`]
//! registry, whose channels carry [`PageMessage`]s to each page.

pub mod cache;
pub mod fetch;
pub mod handoff;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

pub use cache::{Cache, CacheError, CacheStorage};
pub use fetch::{Fetch, FetchError, HttpFetcher, Response};
pub use handoff::{
    ClientId, Clients, FileHandle, HandoffError, LaunchFile, PageMessage, relay_file_open,
};

pub const DEFAULT_GENERATION: &str = "textpad-v1";

/// Hosts whose responses are dynamic and credentialed; never served from cache.
pub const GITHUB_API_HOST: &str = "api.github.com";

const DEFAULT_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/style.css",
    "/script.js",
    "https://cdn.jsdelivr.net/npm/jszip@3.10.1/dist/jszip.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/FileSaver.js/2.0.5/FileSaver.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/pdf-lib/1.17.1/pdf-lib.min.js",
];

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{url} needs an asset origin to resolve against")]
    NoOrigin { url: String },
    #[error("invalid asset url {url}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("install failed: {url} answered {status}")]
    InstallStatus { url: String, status: u16 },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("background worker has stopped")]
    Stopped,
}

/// The fixed asset list of one cache generation.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    pub generation: String,
    pub origin: Option<Url>,
    pub urls: Vec<String>,
    pub passthrough_hosts: Vec<String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION.to_string(),
            origin: None,
            urls: DEFAULT_ASSETS.iter().map(ToString::to_string).collect(),
            passthrough_hosts: vec![GITHUB_API_HOST.to_string()],
        }
    }
}

impl AssetManifest {
    #[must_use]
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    #[must_use]
    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = generation.into();
        self
    }

    #[must_use]
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Also send requests for `host` straight to the network.
    #[must_use]
    pub fn with_passthrough_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        if !self.passthrough_hosts.contains(&host) {
            self.passthrough_hosts.push(host);
        }
        self
    }

    /// Absolute URLs in manifest order. Root-relative entries resolve
    /// against the origin.
    ///
    /// # Errors
    /// Returns an error for a relative entry without an origin or an entry
    /// that does not parse.
    pub fn resolve(&self) -> Result<Vec<Url>, WorkerError> {
        self.urls
            .iter()
            .map(|raw| {
                let parsed = match Url::parse(raw) {
                    Err(url::ParseError::RelativeUrlWithoutBase) => {
                        let origin = self.origin.as_ref().ok_or_else(|| WorkerError::NoOrigin {
                            url: raw.clone(),
                        })?;
                        origin.join(raw)
                    }
                    other => other,
                };
                parsed.map_err(|source| WorkerError::BadUrl {
                    url: raw.clone(),
                    source,
                })
            })
            .collect()
    }

    pub fn is_passthrough(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.passthrough_hosts.iter().any(|h| h == host))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cached,
    Network,
    Passthrough,
}

#[derive(Debug, Clone)]
pub struct Served {
    pub from: ServedFrom,
    pub response: Response,
}

/// Worker state: the manifest, the cache storage and the page registry.
pub struct BackgroundWorker<F> {
    manifest: AssetManifest,
    storage: CacheStorage,
    fetcher: F,
    clients: Arc<Clients>,
}

impl<F: Fetch> BackgroundWorker<F> {
    pub fn new(manifest: AssetManifest, cache_root: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            manifest,
            storage: CacheStorage::new(cache_root),
            fetcher,
            clients: Arc::new(Clients::new()),
        }
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    /// Fetch every manifest URL and store them as the current generation.
    ///
    /// Nothing is written unless every fetch returned a 2xx response.
    ///
    /// # Errors
    /// Returns the first fetch, status or storage failure.
    pub fn install(&self) -> Result<usize, WorkerError> {
        let urls = self.manifest.resolve()?;
        let mut responses = Vec::with_capacity(urls.len());
        for url in &urls {
            let response = self.fetcher.fetch(url)?;
            if !response.is_ok() {
                return Err(WorkerError::InstallStatus {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            responses.push(response);
        }
        self.storage.put_all(&self.manifest.generation, &responses)?;
        info!(
            generation = %self.manifest.generation,
            assets = responses.len(),
            "asset cache installed"
        );
        Ok(responses.len())
    }

    /// Delete every generation other than the current one.
    ///
    /// # Errors
    /// Returns an error if the generations cannot be listed or deleted.
    pub fn activate(&self) -> Result<Vec<String>, WorkerError> {
        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name != self.manifest.generation && self.storage.delete(&name)? {
                deleted.push(name);
            }
        }
        info!(generation = %self.manifest.generation, ?deleted, "asset cache activated");
        Ok(deleted)
    }

    /// Install if the current generation is missing, then activate.
    ///
    /// # Errors
    /// Returns an install or activate failure.
    pub fn register(&self) -> Result<Vec<String>, WorkerError> {
        if !self.storage.has(&self.manifest.generation) {
            self.install()?;
        }
        self.activate()
    }

    /// Answer a request cache-first. Network answers are never stored.
    ///
    /// # Errors
    /// Returns an error only when the network had to be used and failed.
    pub fn handle_fetch(&self, url: &Url) -> Result<Served, WorkerError> {
        if self.manifest.is_passthrough(url) {
            let response = self.fetcher.fetch(url)?;
            return Ok(Served {
                from: ServedFrom::Passthrough,
                response,
            });
        }

        let cached = self
            .storage
            .open(&self.manifest.generation)
            .and_then(|cache| cache.match_url(url.as_str()));
        match cached {
            Ok(Some(response)) => {
                debug!(%url, "served from cache");
                return Ok(Served {
                    from: ServedFrom::Cached,
                    response,
                });
            }
            Ok(None) => {}
            Err(err) => warn!(%url, %err, "cache lookup failed, using network"),
        }

        let response = self.fetcher.fetch(url)?;
        Ok(Served {
            from: ServedFrom::Network,
            response,
        })
    }

    /// Relay a launched file to every page. Failures are logged and dropped.
    pub fn handle_file(&self, file: &dyn FileHandle) {
        if let Ok(delivered) = relay_file_open(&self.clients, file) {
            debug!(delivered, "file handler done");
        }
    }
}

/// Work items for the worker thread.
pub enum WorkerEvent {
    Register,
    Install,
    Activate,
    Fetch {
        url: Url,
        reply: Sender<Result<Served, WorkerError>>,
    },
    FileHandler(Box<dyn FileHandle + Send>),
    Shutdown,
}

impl std::fmt::Debug for WorkerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => f.write_str("Register"),
            Self::Install => f.write_str("Install"),
            Self::Activate => f.write_str("Activate"),
            Self::Fetch { url, .. } => f.debug_struct("Fetch").field("url", url).finish(),
            Self::FileHandler(file) => f.debug_tuple("FileHandler").field(&file.name()).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Run `worker` on its own thread.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn<F>(worker: BackgroundWorker<F>) -> std::io::Result<WorkerHandle>
where
    F: Fetch + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let clients = Arc::clone(worker.clients());
    let thread = thread::Builder::new()
        .name("textpad-worker".to_string())
        .spawn(move || run(&worker, &rx))?;
    Ok(WorkerHandle {
        tx,
        clients,
        thread: Some(thread),
    })
}

fn run<F: Fetch>(worker: &BackgroundWorker<F>, rx: &Receiver<WorkerEvent>) {
    while let Ok(event) = rx.recv() {
        debug!(?event, "worker event");
        match event {
            WorkerEvent::Register => {
                if let Err(err) = worker.register() {
                    error!(%err, "worker registration failed");
                }
            }
            WorkerEvent::Install => {
                if let Err(err) = worker.install() {
                    error!(%err, "asset install failed");
                }
            }
            WorkerEvent::Activate => {
                if let Err(err) = worker.activate() {
                    error!(%err, "asset activation failed");
                }
            }
            WorkerEvent::Fetch { url, reply } => {
                let _ = reply.send(worker.handle_fetch(&url));
            }
            WorkerEvent::FileHandler(file) => worker.handle_file(file.as_ref()),
            WorkerEvent::Shutdown => break,
        }
    }
    debug!("worker stopped");
}

/// Owning handle to a running worker. Dropping it stops the thread.
pub struct WorkerHandle {
    tx: Sender<WorkerEvent>,
    clients: Arc<Clients>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn clients(&self) -> &Arc<Clients> {
        &self.clients
    }

    /// Register a page; file-open messages arrive on the returned receiver.
    pub fn connect_page(&self) -> (ClientId, Receiver<PageMessage>) {
        self.clients.register()
    }

    /// Queue an event. Returns false once the worker has stopped.
    pub fn send(&self, event: WorkerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn open_file(&self, path: impl Into<PathBuf>) -> bool {
        self.send(WorkerEvent::FileHandler(Box::new(LaunchFile::new(path))))
    }

    /// Fetch through the worker and wait for the answer.
    ///
    /// # Errors
    /// Returns the worker's fetch error, or [`WorkerError::Stopped`].
    pub fn fetch(&self, url: Url) -> Result<Served, WorkerError> {
        let (reply, answer) = mpsc::channel();
        if !self.send(WorkerEvent::Fetch { url, reply }) {
            return Err(WorkerError::Stopped);
        }
        answer.recv().map_err(|_| WorkerError::Stopped)?
    }

    /// Stop the worker after it drains queued events.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(WorkerEvent::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("worker thread panicked");
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
