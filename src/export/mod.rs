//! Turning the document into a downloaded file.
//!
//! Text formats are saved as-is. PDF goes through a [`PdfEngine`]; if
//! generation or saving fails the PDF attempt is discarded and the text is
//! saved instead under a `.txt` name, so a partial PDF is never written.

pub mod pdf;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::document::{Document, FileType};

pub use pdf::{BuiltinPdf, PdfEngine, PdfError};

/// Upper bound on `name (n).ext` probing before giving up.
const MAX_NAME_SUFFIX: u32 = 999;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no free filename for {0} in the download directory")]
    NameExhausted(String),
}

/// Immutable bytes tagged with a media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl Blob {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: &'static str) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
        }
    }
}

/// Destination for exported blobs.
pub trait SaveTarget {
    /// Save `blob` under `filename`, returning where it ended up.
    ///
    /// # Errors
    /// Returns an error if the blob cannot be written.
    fn save(&self, blob: &Blob, filename: &str) -> Result<PathBuf, ExportError>;
}

/// Saves into a directory like a browser download: existing files are never
/// overwritten, a clash becomes `name (1).ext`.
#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DownloadDir {
    fn save(&self, blob: &Blob, filename: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Save {
            path: self.dir.clone(),
            source,
        })?;
        let filename = download_name(filename);
        for n in 0..=MAX_NAME_SUFFIX {
            let path = self.dir.join(numbered_name(&filename, n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    fill_or_discard(file, &path, &blob.bytes)?;
                    return Ok(path);
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(ExportError::Save { path, source }),
            }
        }
        Err(ExportError::NameExhausted(filename))
    }
}

/// Write `bytes` to the freshly created `path`. On failure the partial
/// file is removed so nothing truncated is left in the download dir.
fn fill_or_discard(mut file: impl Write, path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let written = file.write_all(bytes).and_then(|()| file.flush());
    drop(file);
    written.map_err(|source| {
        if let Err(err) = fs::remove_file(path) {
            warn!(path = %path.display(), %err, "could not remove partial download");
        }
        ExportError::Save {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Strip path separators and control characters, as browsers do for
/// download names, so the file always lands inside the download dir.
fn download_name(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => "download".to_string(),
        _ => name,
    }
}

fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{filename} ({n})"),
    }
}

/// Rewrite a trailing `.pdf` to `.txt`; any other name just gains `.txt`.
pub fn text_fallback_name(filename: &str) -> String {
    let stem = filename.strip_suffix(".pdf").unwrap_or(filename);
    format!("{stem}.{}", FileType::Txt.extension())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    /// Why the PDF attempt was abandoned, when the text fallback was used.
    pub pdf_failure: Option<String>,
}

impl ExportOutcome {
    pub const fn fell_back(&self) -> bool {
        self.pdf_failure.is_some()
    }
}

pub struct Exporter<S = DownloadDir, P = BuiltinPdf> {
    saver: S,
    pdf: P,
}

impl<S: SaveTarget> Exporter<S, BuiltinPdf> {
    pub const fn new(saver: S) -> Self {
        Self {
            saver,
            pdf: BuiltinPdf,
        }
    }
}

impl<S: SaveTarget, P: PdfEngine> Exporter<S, P> {
    pub fn with_pdf_engine<Q: PdfEngine>(self, pdf: Q) -> Exporter<S, Q> {
        Exporter {
            saver: self.saver,
            pdf,
        }
    }

    pub const fn saver(&self) -> &S {
        &self.saver
    }

    /// Export `document` in its selected format.
    ///
    /// # Errors
    /// Returns an error only when the text save (direct or fallback) fails.
    pub fn export(&self, document: &Document) -> Result<ExportOutcome, ExportError> {
        let filename = document.full_filename();
        let text = document.text();
        if document.filetype.is_pdf() {
            return self.export_pdf(&filename, &text);
        }
        let path = self.export_text(&filename, &text, document.filetype.media_type())?;
        Ok(ExportOutcome {
            path,
            pdf_failure: None,
        })
    }

    /// # Errors
    /// Returns an error if the blob cannot be saved.
    pub fn export_text(
        &self,
        filename: &str,
        text: &str,
        media_type: &'static str,
    ) -> Result<PathBuf, ExportError> {
        let blob = Blob::new(text.as_bytes(), media_type);
        let path = self.saver.save(&blob, filename)?;
        info!(path = %path.display(), bytes = blob.bytes.len(), "text exported");
        Ok(path)
    }

    /// # Errors
    /// Returns an error only if the text fallback cannot be saved either.
    pub fn export_pdf(&self, filename: &str, text: &str) -> Result<ExportOutcome, ExportError> {
        let attempt = self
            .pdf
            .render(text)
            .map_err(|err| err.to_string())
            .and_then(|bytes| {
                self.saver
                    .save(&Blob::new(bytes, FileType::Pdf.media_type()), filename)
                    .map_err(|err| err.to_string())
            });
        match attempt {
            Ok(path) => {
                info!(path = %path.display(), "pdf exported");
                Ok(ExportOutcome {
                    path,
                    pdf_failure: None,
                })
            }
            Err(reason) => {
                error!(%reason, filename, "pdf generation failed, saving as text");
                let fallback = text_fallback_name(filename);
                let path = self.export_text(&fallback, text, FileType::Txt.media_type())?;
                Ok(ExportOutcome {
                    path,
                    pdf_failure: Some(reason),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    /// Records saves instead of touching the disk.
    #[derive(Default)]
    struct MemorySaver {
        saved: RefCell<Vec<(String, Blob)>>,
    }

    impl SaveTarget for MemorySaver {
        fn save(&self, blob: &Blob, filename: &str) -> Result<PathBuf, ExportError> {
            self.saved
                .borrow_mut()
                .push((filename.to_string(), blob.clone()));
            Ok(PathBuf::from(filename))
        }
    }

    struct BrokenPdf;

    impl PdfEngine for BrokenPdf {
        fn render(&self, _text: &str) -> Result<Vec<u8>, PdfError> {
            Err(PdfError::Backend("simulated failure".to_string()))
        }
    }

    fn doc(text: &str, filename: &str, filetype: FileType) -> Document {
        let mut doc = Document::new(text);
        doc.filename = filename.to_string();
        doc.filetype = filetype;
        doc
    }

    #[test]
    fn test_text_export_is_byte_identical() {
        let exporter = Exporter::new(MemorySaver::default());
        let content = "línea uno\r\n\ttabulada\n😀";
        let outcome = exporter
            .export(&doc(content, "notes", FileType::Md))
            .unwrap();
        assert!(!outcome.fell_back());
        let saved = exporter.saver().saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "notes.md");
        assert_eq!(saved[0].1.bytes, content.as_bytes());
        assert_eq!(saved[0].1.media_type, "text/markdown");
    }

    #[test]
    fn test_pdf_export_saves_only_pdf() {
        let exporter = Exporter::new(MemorySaver::default());
        let outcome = exporter
            .export(&doc("hello", "report", FileType::Pdf))
            .unwrap();
        assert!(!outcome.fell_back());
        let saved = exporter.saver().saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "report.pdf");
        assert_eq!(saved[0].1.media_type, "application/pdf");
        assert!(saved[0].1.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_pdf_engine_failure_falls_back_to_text() {
        let exporter = Exporter::new(MemorySaver::default()).with_pdf_engine(BrokenPdf);
        let outcome = exporter
            .export(&doc("keep me", "report", FileType::Pdf))
            .unwrap();
        assert_eq!(
            outcome.pdf_failure.as_deref(),
            Some("PDF generation failed: simulated failure")
        );
        let saved = exporter.saver().saved.borrow();
        assert_eq!(saved.len(), 1, "never both a pdf and a text file");
        assert_eq!(saved[0].0, "report.txt");
        assert_eq!(saved[0].1.bytes, b"keep me");
        assert_eq!(saved[0].1.media_type, "text/plain");
    }

    #[test]
    fn test_unencodable_text_falls_back_with_builtin_engine() {
        let exporter = Exporter::new(MemorySaver::default());
        let outcome = exporter
            .export(&doc("日本語", "", FileType::Pdf))
            .unwrap();
        assert!(outcome.fell_back());
        assert_eq!(outcome.path, PathBuf::from("documento.txt"));
    }

    #[test]
    fn test_text_fallback_name_rewrites_only_trailing_pdf() {
        assert_eq!(text_fallback_name("a.pdf"), "a.txt");
        assert_eq!(text_fallback_name("my.pdf.notes.pdf"), "my.pdf.notes.txt");
        assert_eq!(text_fallback_name("plain"), "plain.txt");
    }

    #[test]
    fn test_download_dir_never_overwrites() {
        let dir = tempdir().unwrap();
        let saver = DownloadDir::new(dir.path().join("downloads"));
        let blob = Blob::new("one", "text/plain");
        let first = saver.save(&blob, "notes.txt").unwrap();
        let second = saver.save(&Blob::new("two", "text/plain"), "notes.txt").unwrap();
        assert_eq!(first.file_name().unwrap(), "notes.txt");
        assert_eq!(second.file_name().unwrap(), "notes (1).txt");
        assert_eq!(fs::read_to_string(first).unwrap(), "one");
        assert_eq!(fs::read_to_string(second).unwrap(), "two");
    }

    /// Accepts `limit` bytes, then fails like a full disk.
    struct FullDisk {
        limit: usize,
        inner: fs::File,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.limit == 0 {
                return Err(io::Error::other("no space left on device"));
            }
            let n = buf.len().min(self.limit);
            self.limit -= n;
            self.inner.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_failed_write_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let inner = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .unwrap();

        let err = fill_or_discard(FullDisk { limit: 4, inner }, &path, b"%PDF-1.7 body").unwrap_err();
        assert!(matches!(err, ExportError::Save { .. }));
        assert!(!path.exists(), "partial pdf left behind");
    }

    #[test]
    fn test_successful_write_keeps_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let file = fs::File::create(&path).unwrap();
        fill_or_discard(file, &path, b"all of it").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"all of it");
    }

    #[test]
    fn test_download_name_strips_separators() {
        assert_eq!(download_name("../x.txt"), ".._x.txt");
        assert_eq!(download_name("a\\b/c.md"), "a_b_c.md");
        assert_eq!(download_name("tab\there.txt"), "tab_here.txt");
        assert_eq!(download_name(".."), "download");
        assert_eq!(download_name(""), "download");
    }

    #[test]
    fn test_download_dir_keeps_traversal_inside() {
        let dir = tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        let saver = DownloadDir::new(&downloads);
        let path = saver
            .save(&Blob::new("x", "text/plain"), "../escape.txt")
            .unwrap();
        assert_eq!(path.parent().unwrap(), downloads);
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_numbered_name_without_extension() {
        assert_eq!(numbered_name("README", 2), "README (2)");
        assert_eq!(numbered_name(".env", 1), ".env (1)");
    }
}
