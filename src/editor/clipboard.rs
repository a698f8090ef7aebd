//! エディタ内クリップボード

/// 直近にカット／コピーされた文字列を1件保持する
#[derive(Debug, Default)]
pub struct Clipboard {
    content: Option<String>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文字列を保持（空文字は無視し、直前の内容を残す）
    pub fn push(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.content = Some(text);
    }

    /// 貼り付け対象
    pub fn current(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}
