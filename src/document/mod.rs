//! The document being edited: text buffer, filename and export format.

mod types;

pub use types::FileType;

use crate::editor::TextBuffer;

/// Filename used whenever the filename field is left empty.
pub const DEFAULT_FILENAME: &str = "documento";

#[derive(Debug)]
pub struct Document {
    pub buffer: TextBuffer,
    /// Filename without extension, as typed in the filename field.
    pub filename: String,
    pub filetype: FileType,
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: TextBuffer::from_text(text),
            filename: DEFAULT_FILENAME.to_string(),
            filetype: FileType::default(),
        }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Filename field value, or the default when the field is empty.
    pub fn effective_filename(&self) -> &str {
        if self.filename.is_empty() {
            DEFAULT_FILENAME
        } else {
            &self.filename
        }
    }

    /// `name.ext` for the current filename and filetype.
    pub fn full_filename(&self) -> String {
        format!("{}.{}", self.effective_filename(), self.filetype.extension())
    }

    /// Load the content of a file opened from outside the editor.
    ///
    /// The filename becomes `name` minus its last dot segment. The filetype
    /// switches only when that segment is one of the selector options.
    pub fn apply_file_open(&mut self, content: &str, name: &str) {
        self.buffer.replace_all(content);
        let (stem, extension) = split_extension(name);
        self.filename = stem.to_string();
        if let Some(filetype) = FileType::from_extension(extension) {
            self.filetype = filetype;
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

/// Split at the last dot. A name without a dot has an empty stem and is
/// entirely extension.
fn split_extension(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or(("", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_filename_defaults_when_empty() {
        let mut doc = Document::new("x");
        doc.filename.clear();
        assert_eq!(doc.full_filename(), "documento.txt");
        doc.filename = "notes".to_string();
        doc.filetype = FileType::Pdf;
        assert_eq!(doc.full_filename(), "notes.pdf");
    }

    #[test]
    fn test_file_open_sets_content_name_and_type() {
        let mut doc = Document::new("before");
        doc.apply_file_open("# Title\n", "notes.md");
        assert_eq!(doc.text(), "# Title\n");
        assert_eq!(doc.filename, "notes");
        assert_eq!(doc.filetype, FileType::Md);
    }

    #[test]
    fn test_file_open_unknown_extension_keeps_filetype() {
        let mut doc = Document::new("");
        doc.filetype = FileType::Html;
        doc.apply_file_open("data", "report.final.docx");
        assert_eq!(doc.filename, "report.final");
        assert_eq!(doc.filetype, FileType::Html);
    }

    #[test]
    fn test_file_open_without_dot_clears_filename() {
        let mut doc = Document::new("");
        doc.filetype = FileType::Css;
        doc.apply_file_open("all", "Makefile");
        assert_eq!(doc.filename, "");
        assert_eq!(doc.filetype, FileType::Css);
        assert_eq!(doc.full_filename(), "documento.css");
    }

    #[test]
    fn test_file_open_dotfile() {
        let mut doc = Document::new("");
        doc.apply_file_open("", ".txt");
        assert_eq!(doc.filename, "");
        assert_eq!(doc.filetype, FileType::Txt);
    }
}
