//! 履歴操作の最小単位

use std::fmt;

/// 変更の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Insert,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Insert => "insert",
            ActionKind::Delete => "delete",
        }
    }
}

/// 1回分の挿入または削除の記録
///
/// 生成後は不変。取り消し・やり直しで undo/redo 履歴の間を移動するだけで複製はされない
#[derive(Debug, PartialEq, Eq)]
pub struct EditAction {
    kind: ActionKind,
    position: usize,
    text: String,
}

impl EditAction {
    pub fn new(kind: ActionKind, position: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            text: text.into(),
        }
    }

    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self::new(ActionKind::Insert, position, text)
    }

    pub fn delete(position: usize, text: impl Into<String>) -> Self {
        Self::new(ActionKind::Delete, position, text)
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// 元の変更時点でのバッファ内の位置（文字単位）
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 文字数
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for EditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} at {}", self.kind.as_str(), self.text, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_chars_not_bytes() {
        let action = EditAction::insert(3, "日本語");
        assert_eq!(action.kind(), ActionKind::Insert);
        assert_eq!(action.position(), 3);
        assert_eq!(action.char_len(), 3);
        assert_eq!(action.text().len(), 9);
    }

    #[test]
    fn display_for_logging() {
        let action = EditAction::delete(2, "cd");
        assert_eq!(action.to_string(), "delete \"cd\" at 2");
    }
}
