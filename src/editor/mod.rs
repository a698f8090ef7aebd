//! エディタのコマンド層
//!
//! ドキュメント・編集履歴・クリップボード・ファイルを束ね、
//! メニュー相当のコマンドをそれぞれ1つのメソッドとして提供する

pub mod clipboard;

pub use clipboard::Clipboard;

use crate::buffer::{Document, TextBuffer};
use crate::config::EditorOptions;
use crate::error::{user_message, EditorError, Result};
use crate::file::{self, PrintSpooler};
use crate::history::{HistoryEngine, HistoryOutcome};
use std::path::{Path, PathBuf};

/// 無題ドキュメントの表示名
pub const UNTITLED: &str = "untitled";

/// コマンド実行の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// 実行が成功したか
    pub success: bool,
    /// 結果メッセージ
    pub message: Option<String>,
    /// アプリケーションを終了するか
    pub should_quit: bool,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
            should_quit: false,
        }
    }

    pub fn success_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            should_quit: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            should_quit: false,
        }
    }

    pub fn quit() -> Self {
        Self {
            success: true,
            message: None,
            should_quit: true,
        }
    }

    fn from_error(error: &EditorError) -> Self {
        log::warn!("command failed: {}", error);
        Self::error(user_message(error))
    }
}

/// 単一ドキュメントのエディタ
pub struct Editor {
    document: Document,
    history: HistoryEngine,
    clipboard: Clipboard,
    file_path: Option<PathBuf>,
    modified: bool,
    spooler: PrintSpooler,
}

impl Editor {
    pub fn new() -> Self {
        let mut document = Document::new();
        let history = HistoryEngine::new();
        history.attach(&mut document);
        Self {
            document,
            history,
            clipboard: Clipboard::new(),
            file_path: None,
            modified: false,
            spooler: PrintSpooler::default(),
        }
    }

    /// 設定を反映したエディタを作成（初期ファイルがあれば開く）
    pub fn with_options(options: &EditorOptions) -> Result<Self> {
        let mut editor = Self::new();
        editor.spooler = PrintSpooler::from_command_line(options.print_command())?;
        if let Some(path) = &options.initial_file {
            if path.exists() {
                editor.open_path(path)?;
            } else {
                // 存在しないファイルは新規作成として扱う
                editor.file_path = Some(path.clone());
            }
        }
        Ok(editor)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// ステータス表示用のファイル名
    pub fn display_name(&self) -> String {
        self.file_path
            .as_deref()
            .map(file::display_name)
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    // ---- 入力 ----

    /// キャレット位置に文字列を入力（選択範囲があれば置き換える）
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        self.delete_selection()?;
        self.document.insert_at_cursor(text)?;
        self.modified = true;
        Ok(())
    }

    pub fn backspace(&mut self) -> Result<()> {
        if self.delete_selection()? {
            return Ok(());
        }
        if self.document.delete_backward()?.is_some() {
            self.modified = true;
        }
        Ok(())
    }

    pub fn delete_forward(&mut self) -> Result<()> {
        if self.delete_selection()? {
            return Ok(());
        }
        if self.document.delete_forward()?.is_some() {
            self.modified = true;
        }
        Ok(())
    }

    fn delete_selection(&mut self) -> Result<bool> {
        let Some((start, end)) = self.document.selection() else {
            return Ok(false);
        };
        self.document.remove_range(start, end - start)?;
        self.document.set_mark(None);
        self.document.set_cursor(start);
        self.modified = true;
        Ok(true)
    }

    // ---- File メニュー ----

    /// 新規：内容と履歴を破棄
    pub fn new_document(&mut self) -> CommandResult {
        if let Err(err) = self.reset_document("") {
            return CommandResult::from_error(&err);
        }
        self.file_path = None;
        self.modified = false;
        CommandResult::success_with_message("New document")
    }

    /// ファイルを開く（`~` を展開）
    pub fn open(&mut self, input: &str) -> CommandResult {
        let result = file::expand_path(input).and_then(|path| self.open_path(&path));
        match result {
            Ok(()) => CommandResult::success_with_message(format!("Opened {}", self.display_name())),
            Err(err) => CommandResult::from_error(&err),
        }
    }

    fn open_path(&mut self, path: &Path) -> Result<()> {
        let content = file::read_file(path)?;
        self.reset_document(&content)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// 内容を差し替え、履歴を新しいドキュメントとして始め直す
    fn reset_document(&mut self, content: &str) -> Result<()> {
        {
            let _guard = self.history.suspend_tracking();
            self.document.replace_all(content)?;
        }
        self.history.clear();
        Ok(())
    }

    /// 現在のパスに保存。パスが無ければ失敗を返す
    pub fn save(&mut self) -> CommandResult {
        let Some(path) = self.file_path.clone() else {
            return CommandResult::error("No file name; use Save As");
        };
        self.save_to(&path)
    }

    /// 指定パスに保存し、以後そのパスを使う
    pub fn save_as(&mut self, input: &str) -> CommandResult {
        match file::expand_path(input) {
            Ok(path) => self.save_to(&path),
            Err(err) => CommandResult::from_error(&err),
        }
    }

    fn save_to(&mut self, path: &Path) -> CommandResult {
        match file::write_file(path, &self.document.text()) {
            Ok(()) => {
                self.file_path = Some(path.to_path_buf());
                self.modified = false;
                CommandResult::success_with_message(format!("Saved {}", self.display_name()))
            }
            Err(err) => CommandResult::from_error(&err),
        }
    }

    pub fn print(&mut self) -> CommandResult {
        match self.spooler.spool(&self.display_name(), &self.document.text()) {
            Ok(()) => CommandResult::success_with_message(format!(
                "Sent {} to {}",
                self.display_name(),
                self.spooler.program()
            )),
            Err(err) => CommandResult::from_error(&err),
        }
    }

    pub fn close(&mut self) -> CommandResult {
        CommandResult::quit()
    }

    // ---- Edit メニュー ----

    /// 切り取り対象：選択範囲、無ければキャレットのある行
    fn target_range(&self) -> (usize, usize) {
        self.document
            .selection()
            .unwrap_or_else(|| self.document.line_range_at(self.document.cursor()))
    }

    pub fn copy(&mut self) -> CommandResult {
        let (start, end) = self.target_range();
        match self.document.substring(start, end) {
            Ok(text) if text.is_empty() => CommandResult::success_with_message("Nothing to copy"),
            Ok(text) => {
                let count = text.chars().count();
                self.clipboard.push(text);
                self.document.set_mark(None);
                CommandResult::success_with_message(format!("Copied {} characters", count))
            }
            Err(err) => CommandResult::from_error(&err.into()),
        }
    }

    /// 切り取り（Delete として履歴に残る）
    pub fn cut(&mut self) -> CommandResult {
        let (start, end) = self.target_range();
        if start == end {
            return CommandResult::success_with_message("Nothing to cut");
        }
        match self.document.remove_range(start, end - start) {
            Ok(text) => {
                let count = text.chars().count();
                self.clipboard.push(text);
                self.document.set_mark(None);
                self.document.set_cursor(start);
                self.modified = true;
                CommandResult::success_with_message(format!("Cut {} characters", count))
            }
            Err(err) => CommandResult::from_error(&err.into()),
        }
    }

    /// 貼り付け（Insert として履歴に残る）
    pub fn paste(&mut self) -> CommandResult {
        let Some(text) = self.clipboard.current().map(str::to_string) else {
            return CommandResult::success_with_message("Clipboard is empty");
        };
        match self.type_text(&text) {
            Ok(()) => CommandResult::success(),
            Err(err) => CommandResult::from_error(&err),
        }
    }

    pub fn undo(&mut self) -> CommandResult {
        let outcome = self.history.undo(&mut self.document);
        self.finish_history_step(outcome)
    }

    pub fn redo(&mut self) -> CommandResult {
        let outcome = self.history.redo(&mut self.document);
        self.finish_history_step(outcome)
    }

    fn finish_history_step(&mut self, outcome: Result<HistoryOutcome>) -> CommandResult {
        match outcome {
            Ok(outcome @ HistoryOutcome::Applied { cursor, .. }) => {
                self.document.set_mark(None);
                self.document.set_cursor(cursor);
                self.modified = true;
                CommandResult::success_with_message(outcome.to_string())
            }
            // 履歴が空なのはエラーではなく通知
            Ok(outcome @ HistoryOutcome::Exhausted(_)) => {
                CommandResult::success_with_message(outcome.to_string())
            }
            Err(err) => CommandResult::from_error(&err),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
