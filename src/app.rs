//! アプリケーション状態
//!
//! キー入力をエディタコマンドへ振り分け、プロンプトとステータスメッセージを管理する
//! 端末には依存しないため、そのままテストできる

use crate::config::EditorOptions;
use crate::editor::{CommandResult, Editor};
use crate::error::Result;
use crate::input::{command_for, Command};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// ファイル名入力プロンプトの用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    SaveAs,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Open => "Open file: ",
            PromptKind::SaveAs => "Save as: ",
        }
    }
}

/// 1行入力プロンプト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// ステータス行に出すメッセージ
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    shown_at: Instant,
}

impl StatusMessage {
    fn from_result(result: &CommandResult) -> Option<Self> {
        result.message.as_ref().map(|text| Self {
            text: text.clone(),
            is_error: !result.success,
            shown_at: Instant::now(),
        })
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= MESSAGE_TIMEOUT
    }
}

pub struct App {
    editor: Editor,
    prompt: Option<Prompt>,
    message: Option<StatusMessage>,
    running: bool,
}

impl App {
    pub fn new() -> Self {
        Self::with_editor(Editor::new())
    }

    pub fn with_options(options: &EditorOptions) -> Result<Self> {
        Ok(Self::with_editor(Editor::with_options(options)?))
    }

    pub fn with_editor(editor: Editor) -> Self {
        Self {
            editor,
            prompt: None,
            message: None,
            running: true,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 期限切れのメッセージを消す
    pub fn tick(&mut self) {
        if self.message.as_ref().is_some_and(StatusMessage::is_expired) {
            self.message = None;
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return Ok(());
        }
        if let Some(command) = command_for(&key) {
            self.execute(command)?;
        }
        Ok(())
    }

    /// 端末の貼り付け（ブラケットペースト）を1回の挿入として扱う
    pub fn handle_paste(&mut self, text: &str) -> Result<()> {
        match self.prompt.as_mut() {
            Some(prompt) => prompt.input.push_str(text.trim_end_matches(['\r', '\n'])),
            None => self.editor.type_text(&text.replace("\r\n", "\n"))?,
        }
        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> Result<()> {
        if command.is_edit() {
            self.message = None;
        }

        let result = match command {
            Command::InsertChar(ch) => {
                let mut buf = [0; 4];
                self.editor.type_text(ch.encode_utf8(&mut buf))?;
                None
            }
            Command::Newline => {
                self.editor.type_text("\n")?;
                None
            }
            Command::Backspace => {
                self.editor.backspace()?;
                None
            }
            Command::DeleteForward => {
                self.editor.delete_forward()?;
                None
            }
            Command::MoveLeft => self.navigate(|doc| doc.move_left()),
            Command::MoveRight => self.navigate(|doc| doc.move_right()),
            Command::MoveUp => self.navigate(|doc| doc.move_vertical(false)),
            Command::MoveDown => self.navigate(|doc| doc.move_vertical(true)),
            Command::LineStart => self.navigate(|doc| doc.move_line_start()),
            Command::LineEnd => self.navigate(|doc| doc.move_line_end()),
            Command::ToggleMark => {
                let active = self.editor.document_mut().toggle_mark();
                Some(CommandResult::success_with_message(if active {
                    "Mark set"
                } else {
                    "Mark cleared"
                }))
            }
            Command::New => Some(self.editor.new_document()),
            Command::Open => {
                self.open_prompt(PromptKind::Open);
                None
            }
            Command::Save if self.editor.file_path().is_none() => {
                self.open_prompt(PromptKind::SaveAs);
                None
            }
            Command::Save => Some(self.editor.save()),
            Command::SaveAs => {
                self.open_prompt(PromptKind::SaveAs);
                None
            }
            Command::Print => Some(self.editor.print()),
            Command::Cut => Some(self.editor.cut()),
            Command::Copy => Some(self.editor.copy()),
            Command::Paste => Some(self.editor.paste()),
            Command::Undo => Some(self.editor.undo()),
            Command::Redo => Some(self.editor.redo()),
            Command::Close => Some(self.editor.close()),
            Command::Cancel => {
                self.editor.document_mut().set_mark(None);
                None
            }
        };

        if let Some(result) = result {
            self.apply_result(&result);
        }
        Ok(())
    }

    fn navigate(&mut self, movement: impl FnOnce(&mut crate::buffer::Document)) -> Option<CommandResult> {
        movement(self.editor.document_mut());
        None
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        let input = match kind {
            PromptKind::SaveAs => self
                .editor
                .file_path()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
            PromptKind::Open => String::new(),
        };
        self.prompt = Some(Prompt { kind, input });
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => self.cancel_prompt(),
            KeyCode::Char('g') if ctrl => self.cancel_prompt(),
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    let result = match prompt.kind {
                        PromptKind::Open => self.editor.open(&prompt.input),
                        PromptKind::SaveAs => self.editor.save_as(&prompt.input),
                    };
                    self.apply_result(&result);
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn cancel_prompt(&mut self) {
        self.prompt = None;
        self.apply_result(&CommandResult::success_with_message("Cancelled"));
    }

    fn apply_result(&mut self, result: &CommandResult) {
        if result.should_quit {
            log::info!("close requested");
            self.running = false;
        }
        if let Some(message) = StatusMessage::from_result(result) {
            self.message = Some(message);
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, text: &str) {
        for ch in text.chars() {
            let code = if ch == '\n' { KeyCode::Enter } else { KeyCode::Char(ch) };
            app.handle_key_event(key(code)).unwrap();
        }
    }

    #[test]
    fn each_keystroke_is_its_own_undo_step() {
        let mut app = App::new();
        type_str(&mut app, "hi\n");
        assert_eq!(app.editor().text(), "hi\n");
        assert_eq!(app.editor().history().undo_len(), 3);

        app.handle_key_event(ctrl('z')).unwrap();
        assert_eq!(app.editor().text(), "hi");
        assert_eq!(app.message().map(|m| m.text.as_str()), Some("Undo insert"));
    }

    #[test]
    fn empty_undo_shows_notice_not_error() {
        let mut app = App::new();
        app.handle_key_event(ctrl('z')).unwrap();
        let message = app.message().unwrap();
        assert_eq!(message.text, "Nothing to undo");
        assert!(!message.is_error);
    }

    #[test]
    fn open_prompt_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.txt");
        std::fs::write(&path, "prompted").unwrap();

        let mut app = App::new();
        app.handle_key_event(ctrl('o')).unwrap();
        assert_eq!(app.prompt().map(|p| p.kind), Some(PromptKind::Open));

        app.handle_paste(&format!("{}\n", path.display())).unwrap();
        app.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert!(app.prompt().is_none());
        assert_eq!(app.editor().text(), "prompted");
    }

    #[test]
    fn save_without_path_opens_prompt_and_escape_cancels() {
        let mut app = App::new();
        type_str(&mut app, "x");
        app.handle_key_event(ctrl('s')).unwrap();
        assert_eq!(app.prompt().map(|p| p.kind), Some(PromptKind::SaveAs));

        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(app.prompt().is_none());
        assert_eq!(app.message().unwrap().text, "Cancelled");
        assert_eq!(app.editor().text(), "x");
    }

    #[test]
    fn close_stops_the_loop() {
        let mut app = App::new();
        assert!(app.is_running());
        app.handle_key_event(ctrl('q')).unwrap();
        assert!(!app.is_running());
    }

    #[test]
    fn bracketed_paste_is_one_action() {
        let mut app = App::new();
        app.handle_paste("line one\r\nline two").unwrap();
        assert_eq!(app.editor().text(), "line one\nline two");
        assert_eq!(app.editor().history().undo_len(), 1);
    }
}
