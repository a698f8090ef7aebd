//! バッファ管理モジュール
//!
//! テキストデータの保持と、編集履歴が利用する抽象バッファ能力を提供

pub mod document;
pub mod gap_buffer;

pub use document::Document;
pub use gap_buffer::GapBuffer;

use crate::error::buffer::Result;

/// 変更イベント
///
/// 位置はすべて文字単位。`Delete` の `content` は削除前のバッファから読み出した文字列
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Insert { position: usize, content: String },
    Delete { position: usize, content: String },
}

/// 変更通知リスナー
pub trait ChangeListener {
    fn on_change(&mut self, event: &ChangeEvent);
}

/// 変更通知システム
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// リスナーを追加
    pub fn add_listener(&mut self, listener: Box<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    /// 登録済みリスナーを全て外す
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// 変更を通知
    pub fn notify(&mut self, event: ChangeEvent) {
        for listener in &mut self.listeners {
            listener.on_change(&event);
        }
    }
}

/// 編集履歴エンジンが操作対象とするバッファの最小能力
///
/// 成功した変更ごとに、登録済みリスナーへ同期的に `ChangeEvent` を届けること
pub trait TextBuffer {
    /// `position` に `text` を挿入
    fn insert_at(&mut self, position: usize, text: &str) -> Result<()>;

    /// `position` から `length` 文字を削除し、削除した文字列を返す
    fn remove_range(&mut self, position: usize, length: usize) -> Result<String>;

    /// 内容の文字数
    fn content_len(&self) -> usize;

    /// 変更通知の購読
    fn subscribe(&mut self, listener: Box<dyn ChangeListener>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Collect(Rc<RefCell<Vec<ChangeEvent>>>);

    impl ChangeListener for Collect {
        fn on_change(&mut self, event: &ChangeEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    #[test]
    fn notifier_fans_out_to_every_listener() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = ChangeNotifier::new();
        notifier.add_listener(Box::new(Collect(first.clone())));
        notifier.add_listener(Box::new(Collect(second.clone())));
        assert_eq!(notifier.listener_count(), 2);

        notifier.notify(ChangeEvent::Insert {
            position: 0,
            content: "a".to_string(),
        });

        assert_eq!(first.borrow().len(), 1);
        assert_eq!(*first.borrow(), *second.borrow());

        notifier.clear();
        notifier.notify(ChangeEvent::Delete {
            position: 0,
            content: "a".to_string(),
        });
        assert_eq!(first.borrow().len(), 1);
    }
}
