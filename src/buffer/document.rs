//! 編集対象ドキュメント
//!
//! ギャップバッファ・キャレット・マークを束ね、変更を `ChangeEvent` として通知する

use super::{ChangeEvent, ChangeListener, ChangeNotifier, GapBuffer, TextBuffer};
use crate::error::buffer::Result;
use crate::error::BufferError;

/// テキストドキュメント
#[derive(Default)]
pub struct Document {
    /// テキストバッファ
    buffer: GapBuffer,
    /// キャレット位置（文字単位）
    cursor: usize,
    /// 選択範囲の起点
    mark: Option<usize>,
    /// 変更通知システム
    notifier: ChangeNotifier,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文字列からドキュメントを作成（通知は発生しない）
    pub fn from_text(text: &str) -> Self {
        Self {
            buffer: GapBuffer::from_text(text),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn substring(&self, start: usize, end: usize) -> Result<String> {
        self.buffer.substring(start, end)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// キャレットを移動（内容の範囲にクランプ）
    pub fn set_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.buffer.len_chars());
    }

    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    pub fn set_mark(&mut self, mark: Option<usize>) {
        self.mark = mark.map(|pos| pos.min(self.buffer.len_chars()));
    }

    /// マークが無ければキャレット位置に設定し、あれば解除する
    pub fn toggle_mark(&mut self) -> bool {
        if self.mark.take().is_none() {
            self.mark = Some(self.cursor);
        }
        self.mark.is_some()
    }

    /// マークとキャレットで挟まれた空でない範囲
    pub fn selection(&self) -> Option<(usize, usize)> {
        let mark = self.mark?;
        let (start, end) = if mark <= self.cursor {
            (mark, self.cursor)
        } else {
            (self.cursor, mark)
        };
        (start < end).then_some((start, end))
    }

    /// `position` を含む行の範囲（末尾の改行を含む）
    pub fn line_range_at(&self, position: usize) -> (usize, usize) {
        let starts = self.buffer.line_start_positions();
        let index = match starts.binary_search(&position) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let start = starts[index];
        let end = starts
            .get(index + 1)
            .copied()
            .unwrap_or_else(|| self.buffer.len_chars());
        (start, end)
    }

    /// キャレットの行・列（0始まり、文字単位）
    pub fn cursor_line_column(&self) -> (usize, usize) {
        let starts = self.buffer.line_start_positions();
        let line = match starts.binary_search(&self.cursor) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        (line, self.cursor - starts[line])
    }

    /// 行ごとのテキスト（改行を除く）
    pub fn lines(&self) -> Vec<String> {
        self.text().split('\n').map(str::to_string).collect()
    }

    /// キャレット位置に挿入し、キャレットを挿入文字列の後ろへ進める
    pub fn insert_at_cursor(&mut self, text: &str) -> Result<()> {
        let position = self.cursor;
        self.insert_at(position, text)?;
        self.cursor = position + text.chars().count();
        Ok(())
    }

    /// キャレット直前の1文字を削除
    pub fn delete_backward(&mut self) -> Result<Option<String>> {
        if self.cursor == 0 {
            return Ok(None);
        }
        let removed = self.remove_range(self.cursor - 1, 1)?;
        Ok(Some(removed))
    }

    /// キャレット位置の1文字を削除
    pub fn delete_forward(&mut self) -> Result<Option<String>> {
        if self.cursor >= self.buffer.len_chars() {
            return Ok(None);
        }
        let removed = self.remove_range(self.cursor, 1)?;
        Ok(Some(removed))
    }

    /// 内容全体を置き換える
    ///
    /// 旧内容の Delete と新内容の Insert がそれぞれ通知される
    pub fn replace_all(&mut self, text: &str) -> Result<()> {
        let len = self.buffer.len_chars();
        self.remove_range(0, len)?;
        self.insert_at(0, text)?;
        self.cursor = 0;
        self.mark = None;
        Ok(())
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.set_cursor(self.cursor + 1);
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_range_at(self.cursor).0;
    }

    pub fn move_line_end(&mut self) {
        let (start, end) = self.line_range_at(self.cursor);
        let ends_with_newline = end > start && self.buffer.char_at(end - 1) == Some('\n');
        self.cursor = if ends_with_newline { end - 1 } else { end };
    }

    /// 上下の行へ移動（列は行長にクランプ）
    pub fn move_vertical(&mut self, down: bool) {
        let starts = self.buffer.line_start_positions();
        let (line, column) = self.cursor_line_column();
        let target = if down {
            if line + 1 >= starts.len() {
                return;
            }
            line + 1
        } else {
            if line == 0 {
                return;
            }
            line - 1
        };
        let start = starts[target];
        let line_end = starts
            .get(target + 1)
            .map(|next| next - 1)
            .unwrap_or_else(|| self.buffer.len_chars());
        self.cursor = (start + column).min(line_end);
    }

    fn shift_after_insert(pos: usize, at: usize, len: usize) -> usize {
        if pos > at {
            pos + len
        } else {
            pos
        }
    }

    fn shift_after_remove(pos: usize, at: usize, len: usize) -> usize {
        if pos >= at + len {
            pos - len
        } else if pos > at {
            at
        } else {
            pos
        }
    }
}

impl TextBuffer for Document {
    fn insert_at(&mut self, position: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            if position > self.buffer.len_chars() {
                return Err(BufferError::InvalidPosition {
                    position,
                    len: self.buffer.len_chars(),
                });
            }
            return Ok(());
        }

        self.buffer.insert_str(position, text)?;

        let len = text.chars().count();
        self.cursor = Self::shift_after_insert(self.cursor, position, len);
        self.mark = self.mark.map(|m| Self::shift_after_insert(m, position, len));

        self.notifier.notify(ChangeEvent::Insert {
            position,
            content: text.to_string(),
        });
        Ok(())
    }

    fn remove_range(&mut self, position: usize, length: usize) -> Result<String> {
        let end = position.checked_add(length).ok_or(BufferError::InvalidPosition {
            position,
            len: self.buffer.len_chars(),
        })?;

        // 削除文字列は削除処理そのものが削除前に読み出した値を使う
        let removed = self.buffer.delete_range(position, end)?;
        if removed.is_empty() {
            return Ok(removed);
        }

        self.cursor = Self::shift_after_remove(self.cursor, position, length);
        self.mark = self.mark.map(|m| Self::shift_after_remove(m, position, length));

        self.notifier.notify(ChangeEvent::Delete {
            position,
            content: removed.clone(),
        });
        Ok(removed)
    }

    fn content_len(&self) -> usize {
        self.buffer.len_chars()
    }

    fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
        self.notifier.add_listener(listener);
    }
}
