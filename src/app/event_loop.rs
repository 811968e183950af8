use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::debug;

use crate::app::{App, Message, Model, update};

/// How long to wait for input before checking the worker's page channel.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl App {
    /// Run the main event loop until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal, textpad requires an interactive terminal")?;
        let _ = execute!(std::io::stdout(), EnableBracketedPaste);
        let size = terminal.size()?;
        let mut model = self.initial_model((size.width, size.height));

        let result = self.event_loop(&mut terminal, &mut model);

        let _ = execute!(std::io::stdout(), DisableBracketedPaste);
        ratatui::restore();
        result
    }

    /// Apply one message: pure update, then its side effects.
    pub(super) fn dispatch(&mut self, model: &mut Model, msg: Message) {
        debug!(?msg, "message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, &side_msg);
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let mut needs_render = true;

        loop {
            for msg in self.drain_page_messages() {
                self.dispatch(model, msg);
                needs_render = true;
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if event::poll(POLL_INTERVAL)? {
                if let Some(msg) = Self::handle_event(&event::read()?, model) {
                    self.dispatch(model, msg);
                    needs_render = true;
                }
                // Coalesce key repeat and paste bursts into a single render.
                while event::poll(Duration::ZERO)? {
                    if let Some(msg) = Self::handle_event(&event::read()?, model) {
                        self.dispatch(model, msg);
                        needs_render = true;
                    }
                }
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
