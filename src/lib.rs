//! tedit - 取り消し・やり直し付きのテキストエディタ
//!
//! 文書の変更を履歴として記録し、逆操作の適用で Undo/Redo を行う

// コアモジュール
pub mod app;
pub mod config;
pub mod error;
pub mod frontend;
pub mod logging;

// データ層
pub mod buffer;
pub mod file;
pub mod history;

// 編集層
pub mod editor;

// ロジック層
pub mod input;

// 表示層
pub mod ui;

// 公開API
pub use app::App;
pub use buffer::{Document, TextBuffer};
pub use error::{EditorError, Result};
pub use frontend::TuiApplication;
pub use history::{HistoryEngine, HistoryOutcome};
