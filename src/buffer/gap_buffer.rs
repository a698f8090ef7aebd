//! ギャップバッファ実装
//!
//! 文字（Unicodeスカラー値）単位の位置で操作するギャップバッファ

use crate::error::buffer::Result;
use crate::error::BufferError;
use std::fmt;

const DEFAULT_GAP_CAPACITY: usize = 4096;
const MIN_GAP_RESERVE: usize = 1024;
const MAX_GAP_CAPACITY: usize = 64 * 1024;
const GAP_GROWTH_FACTOR: usize = 2;

/// ギャップバッファ構造体
///
/// 直前の編集位置付近にギャップ（空き領域）を保持し、
/// 連続する挿入・削除を高速化する
#[derive(Debug, Clone)]
pub struct GapBuffer {
    /// 内部バッファ（UTF-8バイト列）
    buffer: Vec<u8>,
    /// ギャップの開始位置（バイト単位）
    gap_start: usize,
    /// ギャップの終了位置（排他的、バイト単位）
    gap_end: usize,
    /// 文字数（挿入・削除ごとに更新）
    char_count: usize,
}

impl GapBuffer {
    /// 新しい空のギャップバッファを作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_GAP_CAPACITY)
    }

    /// 指定容量で新しいギャップバッファを作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            gap_start: 0,
            gap_end: capacity,
            char_count: 0,
        }
    }

    /// 文字列からギャップバッファを作成
    pub fn from_text(s: &str) -> Self {
        let bytes = s.as_bytes();
        let gap_size = (bytes.len().max(DEFAULT_GAP_CAPACITY) / 4).max(MIN_GAP_RESERVE);
        let total_size = bytes.len() + gap_size;

        let mut buffer = Vec::with_capacity(total_size);
        buffer.extend_from_slice(bytes);
        buffer.resize(total_size, 0);

        Self {
            buffer,
            gap_start: bytes.len(),
            gap_end: total_size,
            char_count: s.chars().count(),
        }
    }

    fn prefix_str(&self) -> &str {
        // gap_start / gap_end は常に文字境界に置かれる
        std::str::from_utf8(&self.buffer[..self.gap_start]).unwrap_or_default()
    }

    fn suffix_str(&self) -> &str {
        std::str::from_utf8(&self.buffer[self.gap_end..]).unwrap_or_default()
    }

    /// 現在のギャップサイズを取得
    pub fn gap_size(&self) -> usize {
        self.gap_end - self.gap_start
    }

    /// 文字数を取得
    pub fn len_chars(&self) -> usize {
        self.char_count
    }

    /// 有効なバイト数を取得
    pub fn len_bytes(&self) -> usize {
        self.gap_start + (self.buffer.len() - self.gap_end)
    }

    pub fn is_empty(&self) -> bool {
        self.len_bytes() == 0
    }

    /// 全テキストを連続した文字列として取得
    pub fn text(&self) -> String {
        let mut result = String::with_capacity(self.len_bytes());
        result.push_str(self.prefix_str());
        result.push_str(self.suffix_str());
        result
    }

    /// 指定範囲 `[start, end)` のテキストを取得
    pub fn substring(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        let start_byte = self.char_to_byte(start)?;
        let end_byte = self.char_to_byte(end)?;

        let mut out = String::with_capacity(end_byte - start_byte);
        let prefix = self.prefix_str();
        let suffix = self.suffix_str();
        let split = prefix.len();

        if start_byte < split {
            out.push_str(&prefix[start_byte..end_byte.min(split)]);
        }
        if end_byte > split {
            out.push_str(&suffix[start_byte.max(split) - split..end_byte - split]);
        }
        Ok(out)
    }

    /// 指定位置に文字列を挿入
    pub fn insert_str(&mut self, pos: usize, s: &str) -> Result<()> {
        if pos > self.char_count {
            return Err(BufferError::InvalidPosition {
                position: pos,
                len: self.char_count,
            });
        }
        if s.is_empty() {
            return Ok(());
        }

        let byte_pos = self.char_to_byte(pos)?;
        self.move_gap_to(byte_pos);

        if self.gap_size() < s.len() {
            self.grow_gap(s.len());
        }

        let gap_pos = self.gap_start;
        self.buffer[gap_pos..gap_pos + s.len()].copy_from_slice(s.as_bytes());
        self.gap_start += s.len();
        self.char_count += s.chars().count();
        Ok(())
    }

    /// 指定位置に文字を挿入
    #[cfg(test)]
    fn insert_char(&mut self, pos: usize, ch: char) -> Result<()> {
        let mut buf = [0; 4];
        self.insert_str(pos, ch.encode_utf8(&mut buf))
    }

    /// 指定範囲 `[start, end)` を削除し、削除前に読み出したテキストを返す
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<String> {
        let removed = self.substring(start, end)?;
        if removed.is_empty() {
            return Ok(removed);
        }

        let start_byte = self.char_to_byte(start)?;
        let end_byte = start_byte + removed.len();

        self.move_gap_to(end_byte);
        self.gap_start = start_byte;
        self.char_count -= end - start;
        Ok(removed)
    }

    /// 指定位置の文字を取得
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.prefix_str().chars().chain(self.suffix_str().chars()).nth(pos)
    }

    /// 行の開始位置（文字単位）のリストを取得
    pub fn line_start_positions(&self) -> Vec<usize> {
        let mut starts = vec![0];
        for (idx, ch) in self.prefix_str().chars().chain(self.suffix_str().chars()).enumerate() {
            if ch == '\n' {
                starts.push(idx + 1);
            }
        }
        starts
    }

    /// 現在のギャップ位置を取得（文字単位）
    #[cfg(test)]
    fn gap_position(&self) -> usize {
        self.prefix_str().chars().count()
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.char_count {
            return Err(BufferError::InvalidRange {
                start,
                end,
                len: self.char_count,
            });
        }
        Ok(())
    }

    /// 文字位置をテキスト上のバイト位置に変換
    fn char_to_byte(&self, char_pos: usize) -> Result<usize> {
        if char_pos > self.char_count {
            return Err(BufferError::InvalidPosition {
                position: char_pos,
                len: self.char_count,
            });
        }

        let prefix = self.prefix_str();
        let mut remaining = char_pos;
        for (byte_idx, _) in prefix.char_indices() {
            if remaining == 0 {
                return Ok(byte_idx);
            }
            remaining -= 1;
        }
        if remaining == 0 {
            return Ok(prefix.len());
        }

        let suffix = self.suffix_str();
        for (byte_idx, _) in suffix.char_indices() {
            if remaining == 0 {
                return Ok(prefix.len() + byte_idx);
            }
            remaining -= 1;
        }
        if remaining == 0 {
            return Ok(prefix.len() + suffix.len());
        }

        Err(BufferError::Utf8Boundary { position: char_pos })
    }

    /// ギャップをテキスト上のバイト位置に移動
    fn move_gap_to(&mut self, pos: usize) {
        if pos < self.gap_start {
            let move_size = self.gap_start - pos;
            let new_gap_end = self.gap_end - move_size;
            self.buffer.copy_within(pos..self.gap_start, new_gap_end);
            self.gap_start = pos;
            self.gap_end = new_gap_end;
        } else if pos > self.gap_start {
            let move_size = pos - self.gap_start;
            self.buffer
                .copy_within(self.gap_end..self.gap_end + move_size, self.gap_start);
            self.gap_start += move_size;
            self.gap_end += move_size;
        }
    }

    /// ギャップを少なくとも `min_additional` バイト分拡張
    fn grow_gap(&mut self, min_additional: usize) {
        let current_gap = self.gap_size();
        let required = min_additional + MIN_GAP_RESERVE;
        let new_gap_size = current_gap
            .max(MIN_GAP_RESERVE)
            .saturating_mul(GAP_GROWTH_FACTOR)
            .clamp(required, MAX_GAP_CAPACITY.max(required));

        let mut new_buffer = Vec::with_capacity(self.len_bytes() + new_gap_size);
        new_buffer.extend_from_slice(&self.buffer[..self.gap_start]);
        new_buffer.resize(self.gap_start + new_gap_size, 0);
        new_buffer.extend_from_slice(&self.buffer[self.gap_end..]);

        self.buffer = new_buffer;
        self.gap_end = self.gap_start + new_gap_size;
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix_str())?;
        f.write_str(self.suffix_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn char_to_byte_index(s: &str, char_pos: usize) -> usize {
        s.char_indices()
            .nth(char_pos)
            .map(|(idx, _)| idx)
            .unwrap_or(s.len())
    }

    #[test]
    fn test_new_gap_buffer() {
        let gap_buffer = GapBuffer::new();
        assert_eq!(gap_buffer.len_chars(), 0);
        assert!(gap_buffer.is_empty());
        assert_eq!(gap_buffer.text(), "");
    }

    #[test]
    fn test_from_text() {
        let text = "Hello, world!";
        let gap_buffer = GapBuffer::from_text(text);
        assert_eq!(gap_buffer.text(), text);
        assert_eq!(gap_buffer.len_chars(), text.chars().count());
    }

    #[test]
    fn test_insert_char_middle() {
        let mut gap_buffer = GapBuffer::from_text("abcd");
        gap_buffer.insert_char(2, 'X').unwrap();
        assert_eq!(gap_buffer.text(), "abXcd");
        assert_eq!(gap_buffer.len_chars(), 5);
    }

    #[test]
    fn test_insert_past_end_is_rejected() {
        let mut gap_buffer = GapBuffer::from_text("abc");
        let err = gap_buffer.insert_str(4, "x").unwrap_err();
        assert_eq!(err, BufferError::InvalidPosition { position: 4, len: 3 });
        assert_eq!(gap_buffer.text(), "abc");
    }

    #[test]
    fn test_delete_range_returns_removed_text() {
        let mut gap_buffer = GapBuffer::from_text("abcdef");
        let deleted = gap_buffer.delete_range(1, 4).unwrap();
        assert_eq!(deleted, "bcd");
        assert_eq!(gap_buffer.text(), "aef");
        assert_eq!(gap_buffer.len_chars(), 3);
    }

    #[test]
    fn test_delete_range_out_of_bounds() {
        let mut gap_buffer = GapBuffer::from_text("abc");
        assert!(gap_buffer.delete_range(2, 5).is_err());
        assert!(gap_buffer.delete_range(2, 1).is_err());
        assert_eq!(gap_buffer.text(), "abc");
    }

    #[test]
    fn test_substring_across_gap() {
        let mut gap_buffer = GapBuffer::from_text("hello world");
        gap_buffer.insert_str(5, ",").unwrap();
        // ギャップは ',' の直後にある
        assert_eq!(gap_buffer.gap_position(), 6);
        assert_eq!(gap_buffer.substring(3, 9).unwrap(), "lo, wo");
    }

    #[test]
    fn test_line_start_positions() {
        let gap_buffer = GapBuffer::from_text("line1\nline2\nline3");
        assert_eq!(gap_buffer.line_start_positions(), vec![0, 6, 12]);
    }

    #[test]
    fn test_utf8_support() {
        let mut gap_buffer = GapBuffer::new();
        gap_buffer.insert_str(0, "こんにちは").unwrap();
        assert_eq!(gap_buffer.len_chars(), 5);

        gap_buffer.insert_char(2, '!').unwrap();
        assert_eq!(gap_buffer.text(), "こん!にちは");
        assert_eq!(gap_buffer.char_at(2), Some('!'));
        assert_eq!(gap_buffer.delete_range(0, 2).unwrap(), "こん");
        assert_eq!(gap_buffer.to_string(), "!にちは");
    }

    #[test]
    fn test_large_insert_grows_gap() {
        let mut gap_buffer = GapBuffer::with_capacity(8);
        let big = "x".repeat(10_000);
        gap_buffer.insert_str(0, &big).unwrap();
        gap_buffer.insert_str(5_000, "mid").unwrap();
        assert_eq!(gap_buffer.len_chars(), 10_003);
        assert_eq!(gap_buffer.substring(4_999, 5_004).unwrap(), "xmidx");
    }

    proptest! {
        #[test]
        fn prop_matches_string_model(initial_text in "[ -~ぁ-んァ-ヶー一-龠０-９]*", ops in prop::collection::vec(any::<(u8, String)>(), 0..20)) {
            let mut gap = GapBuffer::from_text(&initial_text);
            let mut model = initial_text;

            for (selector, payload) in ops {
                let len = gap.len_chars();
                match selector % 2 {
                    0 => {
                        let pos = (selector as usize) % (len + 1);
                        let snippet: String = payload.chars().take(4).collect();
                        gap.insert_str(pos, &snippet).unwrap();
                        let byte_idx = char_to_byte_index(&model, pos);
                        model.insert_str(byte_idx, &snippet);
                    }
                    _ => {
                        if len == 0 {
                            continue;
                        }
                        let pos = (selector as usize) % len;
                        let end = (pos + 3).min(len);
                        let removed = gap.delete_range(pos, end).unwrap();
                        let start = char_to_byte_index(&model, pos);
                        let stop = char_to_byte_index(&model, end);
                        prop_assert_eq!(&removed, &model[start..stop]);
                        model.replace_range(start..stop, "");
                    }
                }
            }

            prop_assert_eq!(gap.text(), model);
        }
    }
}
