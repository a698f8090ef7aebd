//! 編集履歴エンジン
//!
//! バッファの変更通知を `EditAction` として記録し、無制限の undo/redo を提供する

pub mod action;
pub mod tracking;

pub use action::{ActionKind, EditAction};
pub use tracking::TrackingGuard;

use crate::buffer::{ChangeEvent, ChangeListener, TextBuffer};
use crate::error::{EditorError, Result};
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// 履歴を辿る向き
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

/// undo/redo の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// 1件適用した。`cursor` は適用後にキャレットを置くべき位置
    Applied {
        direction: Direction,
        kind: ActionKind,
        cursor: usize,
    },
    /// 履歴が空で何もしなかった
    Exhausted(Direction),
}

impl HistoryOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, HistoryOutcome::Applied { .. })
    }

    pub fn cursor(&self) -> Option<usize> {
        match self {
            HistoryOutcome::Applied { cursor, .. } => Some(*cursor),
            HistoryOutcome::Exhausted(_) => None,
        }
    }
}

impl fmt::Display for HistoryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryOutcome::Applied {
                direction: Direction::Undo,
                kind,
                ..
            } => write!(f, "Undo {}", kind.as_str()),
            HistoryOutcome::Applied {
                direction: Direction::Redo,
                kind,
                ..
            } => write!(f, "Redo {}", kind.as_str()),
            HistoryOutcome::Exhausted(Direction::Undo) => f.write_str("Nothing to undo"),
            HistoryOutcome::Exhausted(Direction::Redo) => f.write_str("Nothing to redo"),
        }
    }
}

/// 編集履歴スタック（どちらも末尾が最新）
#[derive(Debug, Default)]
struct HistoryStack {
    undo: Vec<EditAction>,
    redo: Vec<EditAction>,
}

impl HistoryStack {
    fn push(&mut self, action: EditAction) {
        self.undo.push(action);
        if !self.redo.is_empty() {
            log::debug!("discarding {} redo entries", self.redo.len());
            self.redo.clear();
        }
    }

    fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// 履歴記録器
///
/// バッファのリスナーとして登録される側。エンジンと状態を共有する
#[derive(Clone)]
pub struct HistoryRecorder {
    stack: Rc<RefCell<HistoryStack>>,
    tracking: Rc<Cell<bool>>,
}

impl HistoryRecorder {
    fn new() -> Self {
        Self {
            stack: Rc::new(RefCell::new(HistoryStack::default())),
            tracking: Rc::new(Cell::new(true)),
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.get()
    }

    /// 挿入が完了した直後に呼ばれる
    pub fn on_insert(&self, offset: usize, inserted: &str) {
        self.record(ActionKind::Insert, offset, inserted);
    }

    /// 削除が完了した直後に、削除前に読み出された文字列とともに呼ばれる
    pub fn on_delete(&self, offset: usize, deleted: &str) {
        self.record(ActionKind::Delete, offset, deleted);
    }

    fn record(&self, kind: ActionKind, offset: usize, text: &str) {
        if !self.tracking.get() || text.is_empty() {
            return;
        }
        let action = EditAction::new(kind, offset, text);
        log::trace!("record {}", action);
        self.stack.borrow_mut().push(action);
    }

    fn suspend(&self) -> TrackingGuard {
        TrackingGuard::suspend(&self.tracking)
    }
}

impl ChangeListener for HistoryRecorder {
    fn on_change(&mut self, event: &ChangeEvent) {
        match event {
            ChangeEvent::Insert { position, content } => self.on_insert(*position, content),
            ChangeEvent::Delete { position, content } => self.on_delete(*position, content),
        }
    }
}

/// 履歴管理エンジン
pub struct HistoryEngine {
    recorder: HistoryRecorder,
    attached: Cell<bool>,
}

impl HistoryEngine {
    pub fn new() -> Self {
        Self {
            recorder: HistoryRecorder::new(),
            attached: Cell::new(false),
        }
    }

    /// バッファの変更通知を購読する
    ///
    /// 購読は1回だけ。2回目以降は何もせず `false` を返す。
    /// 以後 `undo`/`redo` には同じバッファを渡すこと
    pub fn attach<B: TextBuffer + ?Sized>(&self, buffer: &mut B) -> bool {
        if self.attached.replace(true) {
            log::warn!("history engine is already attached; ignoring");
            return false;
        }
        buffer.subscribe(Box::new(self.recorder.clone()));
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    pub fn recorder(&self) -> &HistoryRecorder {
        &self.recorder
    }

    pub fn on_insert(&self, offset: usize, inserted: &str) {
        self.recorder.on_insert(offset, inserted);
    }

    pub fn on_delete(&self, offset: usize, deleted: &str) {
        self.recorder.on_delete(offset, deleted);
    }

    /// 記録を止めた状態でバッファを直接変更したいときに使う
    pub fn suspend_tracking(&self) -> TrackingGuard {
        self.recorder.suspend()
    }

    pub fn is_tracking(&self) -> bool {
        self.recorder.is_tracking()
    }

    pub fn can_undo(&self) -> bool {
        !self.recorder.stack.borrow().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.recorder.stack.borrow().redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.recorder.stack.borrow().undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.recorder.stack.borrow().redo.len()
    }

    /// 次に取り消される操作
    pub fn peek_undo(&self) -> Option<Ref<'_, EditAction>> {
        Ref::filter_map(self.recorder.stack.borrow(), |stack| stack.undo.last()).ok()
    }

    /// 次にやり直される操作
    pub fn peek_redo(&self) -> Option<Ref<'_, EditAction>> {
        Ref::filter_map(self.recorder.stack.borrow(), |stack| stack.redo.last()).ok()
    }

    /// 両方の履歴を破棄
    pub fn clear(&mut self) {
        self.recorder.stack.borrow_mut().clear();
    }

    /// 直近の操作を取り消す
    ///
    /// バッファへの適用に失敗した場合、操作は undo 履歴へ戻され、エラーが返る
    pub fn undo<B: TextBuffer + ?Sized>(&mut self, buffer: &mut B) -> Result<HistoryOutcome> {
        let Some(action) = self.recorder.stack.borrow_mut().undo.pop() else {
            log::debug!("undo requested with empty history");
            return Ok(HistoryOutcome::Exhausted(Direction::Undo));
        };

        let result = {
            let _guard = self.recorder.suspend();
            revert(buffer, &action)
        };

        let mut stack = self.recorder.stack.borrow_mut();
        match result {
            Ok(cursor) => {
                log::debug!("undo {}", action);
                let kind = action.kind();
                stack.redo.push(action);
                Ok(HistoryOutcome::Applied {
                    direction: Direction::Undo,
                    kind,
                    cursor,
                })
            }
            Err(err) => {
                log::warn!("undo of {} failed: {}", action, err);
                stack.undo.push(action);
                Err(EditorError::History(err.to_string()))
            }
        }
    }

    /// 直近に取り消した操作をやり直す
    pub fn redo<B: TextBuffer + ?Sized>(&mut self, buffer: &mut B) -> Result<HistoryOutcome> {
        let Some(action) = self.recorder.stack.borrow_mut().redo.pop() else {
            log::debug!("redo requested with empty history");
            return Ok(HistoryOutcome::Exhausted(Direction::Redo));
        };

        let result = {
            let _guard = self.recorder.suspend();
            replay(buffer, &action)
        };

        let mut stack = self.recorder.stack.borrow_mut();
        match result {
            Ok(cursor) => {
                log::debug!("redo {}", action);
                let kind = action.kind();
                stack.undo.push(action);
                Ok(HistoryOutcome::Applied {
                    direction: Direction::Redo,
                    kind,
                    cursor,
                })
            }
            Err(err) => {
                log::warn!("redo of {} failed: {}", action, err);
                stack.redo.push(action);
                Err(EditorError::History(err.to_string()))
            }
        }
    }
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 操作の逆を適用し、キャレット位置を返す
fn revert<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    action: &EditAction,
) -> crate::error::buffer::Result<usize> {
    match action.kind() {
        ActionKind::Insert => {
            buffer.remove_range(action.position(), action.char_len())?;
            Ok(action.position())
        }
        ActionKind::Delete => {
            buffer.insert_at(action.position(), action.text())?;
            Ok(action.position() + action.char_len())
        }
    }
}

/// 操作をもう一度適用し、キャレット位置を返す
fn replay<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    action: &EditAction,
) -> crate::error::buffer::Result<usize> {
    match action.kind() {
        ActionKind::Insert => {
            buffer.insert_at(action.position(), action.text())?;
            Ok(action.position() + action.char_len())
        }
        ActionKind::Delete => {
            buffer.remove_range(action.position(), action.char_len())?;
            Ok(action.position())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ChangeListener, Document};
    use crate::error::BufferError;

    fn attached(text: &str) -> (Document, HistoryEngine) {
        let mut doc = Document::from_text(text);
        let engine = HistoryEngine::new();
        engine.attach(&mut doc);
        (doc, engine)
    }

    #[test]
    fn hello_world_scenario() {
        let (mut doc, mut engine) = attached("");

        doc.insert_at(0, "hello").unwrap();
        doc.insert_at(5, " world").unwrap();
        assert_eq!(doc.text(), "hello world");
        assert_eq!(engine.undo_len(), 2);

        engine.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "hello");
        engine.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "");

        let outcome = engine.redo(&mut doc).unwrap();
        assert_eq!(doc.text(), "hello");
        assert_eq!(outcome.cursor(), Some(5));

        doc.insert_at(5, "!").unwrap();
        assert_eq!(doc.text(), "hello!");
        assert!(!engine.can_redo());

        let outcome = engine.redo(&mut doc).unwrap();
        assert_eq!(outcome, HistoryOutcome::Exhausted(Direction::Redo));
        assert_eq!(outcome.to_string(), "Nothing to redo");
        assert_eq!(doc.text(), "hello!");
    }

    #[test]
    fn delete_scenario() {
        let (mut doc, mut engine) = attached("abcdef");

        doc.remove_range(2, 2).unwrap();
        assert_eq!(doc.text(), "abef");
        {
            let recorded = engine.peek_undo().unwrap();
            assert_eq!(*recorded, EditAction::delete(2, "cd"));
        }

        let outcome = engine.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "abcdef");
        assert_eq!(outcome.cursor(), Some(4));

        let outcome = engine.redo(&mut doc).unwrap();
        assert_eq!(doc.text(), "abef");
        assert_eq!(outcome.cursor(), Some(2));
    }

    #[test]
    fn empty_history_is_a_reported_no_op() {
        let (mut doc, mut engine) = attached("keep");

        let outcome = engine.undo(&mut doc).unwrap();
        assert_eq!(outcome, HistoryOutcome::Exhausted(Direction::Undo));
        assert_eq!(outcome.to_string(), "Nothing to undo");
        assert!(!outcome.is_applied());

        let outcome = engine.redo(&mut doc).unwrap();
        assert_eq!(outcome.to_string(), "Nothing to redo");

        assert_eq!(doc.text(), "keep");
        assert_eq!(engine.undo_len(), 0);
        assert_eq!(engine.redo_len(), 0);
    }

    #[test]
    fn new_edit_clears_whole_redo_history() {
        let (mut doc, mut engine) = attached("");
        for (i, ch) in ["a", "b", "c"].iter().enumerate() {
            doc.insert_at(i, ch).unwrap();
        }
        engine.undo(&mut doc).unwrap();
        engine.undo(&mut doc).unwrap();
        assert_eq!(engine.redo_len(), 2);

        doc.remove_range(0, 1).unwrap();
        assert_eq!(engine.redo_len(), 0);
        assert_eq!(engine.undo_len(), 2);
        assert_eq!(*engine.peek_undo().unwrap(), EditAction::delete(0, "a"));
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn replay_does_not_record() {
        let (mut doc, mut engine) = attached("base");
        doc.insert_at(4, "-x").unwrap();
        doc.remove_range(0, 2).unwrap();
        assert_eq!(engine.undo_len(), 2);

        engine.undo(&mut doc).unwrap();
        assert_eq!((engine.undo_len(), engine.redo_len()), (1, 1));
        engine.undo(&mut doc).unwrap();
        assert_eq!((engine.undo_len(), engine.redo_len()), (0, 2));
        engine.redo(&mut doc).unwrap();
        assert_eq!((engine.undo_len(), engine.redo_len()), (1, 1));
        assert!(engine.is_tracking());
    }

    #[test]
    fn manual_notifications_respect_tracking() {
        let engine = HistoryEngine::new();
        engine.on_insert(0, "typed");
        engine.on_delete(0, "");
        assert_eq!(engine.undo_len(), 1);

        {
            let _guard = engine.suspend_tracking();
            engine.on_insert(5, "ignored");
            engine.on_delete(0, "ignored");
        }
        assert_eq!(engine.undo_len(), 1);
        assert!(engine.is_tracking());
    }

    /// 変更のたびに記録状態を観測するバッファ
    struct ProbeBuffer {
        inner: Document,
        recorder: HistoryRecorder,
        observed: Vec<bool>,
    }

    impl TextBuffer for ProbeBuffer {
        fn insert_at(&mut self, position: usize, text: &str) -> crate::error::buffer::Result<()> {
            self.observed.push(self.recorder.is_tracking());
            self.inner.insert_at(position, text)
        }

        fn remove_range(&mut self, position: usize, length: usize) -> crate::error::buffer::Result<String> {
            self.observed.push(self.recorder.is_tracking());
            self.inner.remove_range(position, length)
        }

        fn content_len(&self) -> usize {
            self.inner.content_len()
        }

        fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
            self.inner.subscribe(listener);
        }
    }

    #[test]
    fn tracking_is_off_only_while_applying() {
        let mut engine = HistoryEngine::new();
        let mut buffer = ProbeBuffer {
            inner: Document::new(),
            recorder: engine.recorder().clone(),
            observed: Vec::new(),
        };
        engine.attach(&mut buffer);

        buffer.insert_at(0, "abc").unwrap();
        engine.undo(&mut buffer).unwrap();
        engine.redo(&mut buffer).unwrap();

        assert_eq!(buffer.observed, vec![true, false, false]);
        assert!(engine.is_tracking());
        assert_eq!(buffer.inner.text(), "abc");
    }

    /// 常に失敗するバッファ
    struct BrokenBuffer;

    impl TextBuffer for BrokenBuffer {
        fn insert_at(&mut self, position: usize, _text: &str) -> crate::error::buffer::Result<()> {
            Err(BufferError::InvalidPosition { position, len: 0 })
        }

        fn remove_range(&mut self, position: usize, length: usize) -> crate::error::buffer::Result<String> {
            Err(BufferError::InvalidRange {
                start: position,
                end: position + length,
                len: 0,
            })
        }

        fn content_len(&self) -> usize {
            0
        }

        fn subscribe(&mut self, _listener: Box<dyn ChangeListener>) {}
    }

    #[test]
    fn failed_replay_restores_history_and_tracking() {
        let mut engine = HistoryEngine::new();
        engine.on_insert(3, "xyz");
        engine.on_delete(0, "q");
        let mut buffer = BrokenBuffer;

        let err = engine.undo(&mut buffer).unwrap_err();
        assert!(matches!(err, EditorError::History(_)));
        assert!(engine.is_tracking());
        assert_eq!((engine.undo_len(), engine.redo_len()), (2, 0));
        assert_eq!(*engine.peek_undo().unwrap(), EditAction::delete(0, "q"));

        // redo 側も同様に元へ戻る
        let (mut doc, mut engine) = attached("q");
        doc.insert_at(1, "r").unwrap();
        engine.undo(&mut doc).unwrap();
        assert!(engine.redo(&mut buffer).is_err());
        assert!(engine.is_tracking());
        assert_eq!((engine.undo_len(), engine.redo_len()), (0, 1));
        assert_eq!(*engine.peek_redo().unwrap(), EditAction::insert(1, "r"));
    }

    #[test]
    fn second_attach_is_ignored() {
        let (mut doc, mut engine) = attached("");
        assert!(engine.is_attached());
        assert!(!engine.attach(&mut doc));

        doc.insert_at(0, "ab").unwrap();
        assert_eq!(engine.undo_len(), 1);
        assert!(engine.undo(&mut doc).unwrap().is_applied());
        assert_eq!(
            engine.undo(&mut doc).unwrap(),
            HistoryOutcome::Exhausted(Direction::Undo)
        );
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn outer_suspension_survives_undo() {
        let (mut doc, mut engine) = attached("");
        doc.insert_at(0, "abc").unwrap();

        let outer = engine.suspend_tracking();
        engine.undo(&mut doc).unwrap();
        assert!(!engine.is_tracking());
        doc.insert_at(0, "zz").unwrap();
        drop(outer);

        assert!(engine.is_tracking());
        assert_eq!((engine.undo_len(), engine.redo_len()), (0, 1));
        assert_eq!(doc.text(), "zz");
    }

    #[test]
    fn clear_discards_both_histories() {
        let (mut doc, mut engine) = attached("");
        doc.insert_at(0, "one").unwrap();
        doc.insert_at(3, " two").unwrap();
        engine.undo(&mut doc).unwrap();

        engine.clear();
        assert!(!engine.can_undo());
        assert!(!engine.can_redo());
        assert!(engine.peek_undo().is_none());
    }

    #[test]
    fn multibyte_offsets() {
        let (mut doc, mut engine) = attached("日本");
        doc.insert_at(1, "語の").unwrap();
        doc.remove_range(0, 2).unwrap();
        assert_eq!(doc.text(), "の本");

        engine.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "日語の本");
        engine.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "日本");
        engine.redo(&mut doc).unwrap();
        engine.redo(&mut doc).unwrap();
        assert_eq!(doc.text(), "の本");
    }
}
