//! File-open relay from the background worker to open pages.
//!
//! A launch hands the worker a [`FileHandle`]. The worker decodes it as
//! text and broadcasts one [`PageMessage::FileOpen`] to every page that is
//! registered at that moment. Delivery is fire-and-forget: pages whose
//! receiver is gone are dropped from the registry and nobody is told.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Messages the worker posts to pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageMessage {
    #[serde(rename = "FILE_OPEN")]
    FileOpen { content: String, name: String },
}

pub type ClientId = u64;

/// Pages currently listening to the worker.
#[derive(Debug, Default)]
pub struct Clients {
    next_id: AtomicU64,
    senders: Mutex<Vec<(ClientId, Sender<PageMessage>)>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page and return its id and the receiving end of its channel.
    pub fn register(&self) -> (ClientId, Receiver<PageMessage>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();
        self.lock().push((id, tx));
        debug!(client = id, "page registered");
        (id, rx)
    }

    /// Send `message` to every registered page, pruning closed ones.
    /// Returns how many pages received it.
    pub fn broadcast(&self, message: &PageMessage) -> usize {
        let mut senders = self.lock();
        senders.retain(|(id, tx)| {
            let delivered = tx.send(message.clone()).is_ok();
            if !delivered {
                debug!(client = id, "page closed, dropping");
            }
            delivered
        });
        senders.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ClientId, Sender<PageMessage>)>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{name} is not valid UTF-8 text")]
    Decode { name: String },
}

/// A file handed to the application by the launcher.
pub trait FileHandle {
    fn name(&self) -> String;

    /// # Errors
    /// Returns an error if the file cannot be read or is not UTF-8.
    fn text(&self) -> Result<String, HandoffError>;
}

/// A file named on the command line or in the open prompt.
#[derive(Debug, Clone)]
pub struct LaunchFile {
    path: PathBuf,
}

impl LaunchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileHandle for LaunchFile {
    fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    fn text(&self) -> Result<String, HandoffError> {
        let bytes = fs::read(&self.path).map_err(|source| HandoffError::Read {
            path: self.path.clone(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|_| HandoffError::Decode { name: self.name() })
    }
}

/// Decode `file` and broadcast it to every page.
///
/// # Errors
/// Returns the read or decode error; nothing is sent in that case.
pub fn relay_file_open(clients: &Clients, file: &dyn FileHandle) -> Result<usize, HandoffError> {
    let name = file.name();
    let content = file.text().inspect_err(|err| {
        error!(%name, %err, "file-open handoff failed");
    })?;
    let delivered = clients.broadcast(&PageMessage::FileOpen {
        content,
        name: name.clone(),
    });
    debug!(%name, delivered, "file-open relayed");
    Ok(delivered)
}
