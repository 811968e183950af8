//! The fixed set of export formats offered by the filetype selector.

use std::fmt;

/// Export format of the document.
///
/// `Txt` is also the format the PDF path falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileType {
    #[default]
    Txt,
    Md,
    Html,
    Css,
    Js,
    Json,
    Xml,
    Csv,
    Pdf,
}

impl FileType {
    /// Selector order.
    pub const ALL: [Self; 9] = [
        Self::Txt,
        Self::Md,
        Self::Html,
        Self::Css,
        Self::Js,
        Self::Json,
        Self::Xml,
        Self::Csv,
        Self::Pdf,
    ];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Html => "html",
            Self::Css => "css",
            Self::Js => "js",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Md => "text/markdown",
            Self::Html => "text/html",
            Self::Css => "text/css",
            Self::Js => "text/javascript",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
        }
    }

    pub const fn is_pdf(self) -> bool {
        matches!(self, Self::Pdf)
    }

    /// Exact match against the option values; no case folding.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ft| ft.extension() == ext)
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn prev(self) -> Self {
        self.offset(Self::ALL.len() - 1)
    }

    fn offset(self, by: usize) -> Self {
        let idx = Self::ALL.iter().position(|ft| *ft == self).unwrap_or(0);
        Self::ALL[(idx + by) % Self::ALL.len()]
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            let options: Vec<_> = Self::ALL.iter().map(|ft| ft.extension()).collect();
            format!("unknown filetype '{s}' (expected one of {})", options.join(", "))
        })
    }
}
