use crate::app::App;
use crate::error::{EditorError, Result, UiError};
use crate::ui::Renderer;
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct TuiApplication {
    app: App,
    renderer: Renderer,
}

impl TuiApplication {
    pub fn new(app: App) -> Self {
        Self {
            app,
            renderer: Renderer::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enter_terminal()?;

        let backend = CrosstermBackend::new(stdout());
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(err) => {
                log::error!("terminal init failed: {}", err);
                let _ = leave_terminal();
                return Err(EditorError::Ui(UiError::TerminalInit));
            }
        };

        let loop_result = self.event_loop(&mut terminal);
        let show_cursor_result = terminal.show_cursor().map_err(|err| terminal_error("show cursor", err));
        drop(terminal);
        let cleanup_result = leave_terminal();

        loop_result.and(show_cursor_result).and(cleanup_result)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while self.app.is_running() {
            self.app.tick();
            self.render(terminal)?;

            if event::poll(POLL_INTERVAL).map_err(|err| terminal_error("event poll", err))? {
                match event::read().map_err(|err| terminal_error("event read", err))? {
                    Event::Key(key_event) => self.app.handle_key_event(key_event)?,
                    Event::Paste(text) => self.app.handle_paste(&text)?,
                    Event::Resize(_, _) => {}
                    Event::Mouse(_) | Event::FocusGained | Event::FocusLost => {}
                }
            }
        }

        Ok(())
    }

    fn render<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let app = &self.app;
        let renderer = &mut self.renderer;
        terminal
            .draw(|frame| renderer.draw(frame, app))
            .map(|_| ())
            .map_err(|err| terminal_error("render", err))
    }
}

fn enter_terminal() -> Result<()> {
    enable_raw_mode().map_err(|err| terminal_error("enable raw mode", err))?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableBracketedPaste)
        .map_err(|err| terminal_error("enter alternate screen", err))?;
    Ok(())
}

fn leave_terminal() -> Result<()> {
    let mut out = stdout();
    execute!(out, DisableBracketedPaste, LeaveAlternateScreen)
        .map_err(|err| terminal_error("leave alternate screen", err))?;
    disable_raw_mode().map_err(|err| terminal_error("disable raw mode", err))?;
    Ok(())
}

fn terminal_error(context: &str, err: impl std::fmt::Display) -> EditorError {
    EditorError::Ui(UiError::RenderingFailed {
        component: format!("{}: {}", context, err),
    })
}
