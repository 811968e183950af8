use tracing::{error, warn};

use crate::app::{App, Message, Model, NoticeLevel};
use crate::github::UploadRequest;
use crate::storage::EDITOR_CONTENT_KEY;

const PDF_FALLBACK_NOTICE: &str = "Error generating the PDF. Saving as text instead.";
const UPLOAD_OK_NOTICE: &str = "File uploaded to GitHub successfully";

impl App {
    pub(super) fn handle_message_side_effects(&mut self, model: &mut Model, msg: &Message) {
        match msg {
            Message::Download => self.download(model),
            Message::Upload => self.upload(model),
            Message::SubmitOpenFile => {
                if let Some(path) = model.pending_open.take()
                    && !self.worker.open_file(path)
                {
                    model.show_notice(NoticeLevel::Error, "Background worker is not running");
                }
            }
            _ => {}
        }
        self.persist(model);
    }

    /// Write the editor text to local storage whenever the buffer changed.
    fn persist(&mut self, model: &Model) {
        let revision = model.document.buffer.revision();
        if revision == self.persisted_revision {
            return;
        }
        match self.store.set(EDITOR_CONTENT_KEY, &model.document.text()) {
            Ok(()) => self.persisted_revision = revision,
            Err(err) => warn!(%err, "failed to persist editor content"),
        }
    }

    fn download(&self, model: &mut Model) {
        match self.exporter.export(&model.document) {
            Ok(outcome) if outcome.fell_back() => {
                model.show_notice(NoticeLevel::Warning, PDF_FALLBACK_NOTICE);
            }
            Ok(_) => {}
            Err(err) => {
                error!(%err, "download failed");
                model.show_notice(NoticeLevel::Error, format!("Download failed: {err}"));
            }
        }
    }

    fn upload(&self, model: &mut Model) {
        let request = UploadRequest {
            owner: model.github.owner.clone(),
            repo: model.github.repo.clone(),
            path: model.github.path.clone(),
            filename: model.document.full_filename(),
            content: model.document.text(),
            token: model.github.token.clone(),
        };
        match self.github.upload(&request) {
            Ok(()) => model.show_notice(NoticeLevel::Info, UPLOAD_OK_NOTICE),
            Err(err) if err.is_validation() => {
                model.show_notice(NoticeLevel::Warning, err.to_string());
            }
            Err(err) => {
                error!(%err, "upload to GitHub failed");
                model.show_notice(
                    NoticeLevel::Error,
                    format!("Error uploading the file: {err}"),
                );
            }
        }
    }
}
