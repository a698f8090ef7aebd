//! エラーハンドリングシステム
//!
//! tedit 全体で使用される統一されたエラー型とユーティリティを定義
//! 空の履歴に対する undo/redo はエラーではなく `HistoryOutcome` で表現する

use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone)]
pub enum EditorError {
    /// ファイル操作エラー
    #[error("File operation failed: {0}")]
    File(#[from] FileError),

    /// バッファ操作エラー
    #[error("Buffer operation failed: {0}")]
    Buffer(#[from] BufferError),

    /// UI操作エラー
    #[error("UI operation failed: {0}")]
    Ui(#[from] UiError),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 履歴の適用に失敗（ホストが前提条件を破った場合のみ）
    #[error("History replay failed: {0}")]
    History(String),
}

/// ファイル操作固有のエラー
#[derive(Error, Debug, Clone)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Print failed: {message}")]
    Print { message: String },
}

/// バッファ操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Invalid position: {position} (length {len})")]
    InvalidPosition { position: usize, len: usize },

    #[error("Invalid range: {start}..{end} (length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("UTF-8 boundary error at position {position}")]
    Utf8Boundary { position: usize },
}

/// UI操作固有のエラー
#[derive(Error, Debug, Clone)]
pub enum UiError {
    #[error("Terminal initialization failed")]
    TerminalInit,

    #[error("Rendering failed: {component}")]
    RenderingFailed { component: String },
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid configuration file: {path}: {message}")]
    InvalidFile { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// ステータス行に出す利用者向けメッセージ
pub fn user_message(error: &EditorError) -> String {
    match error {
        EditorError::File(FileError::NotFound { path }) => format!("File not found: {}", path),
        EditorError::File(FileError::PermissionDenied { path }) => {
            format!("Permission denied: {}", path)
        }
        EditorError::File(FileError::InvalidPath { path }) => format!("Invalid path: {}", path),
        EditorError::File(FileError::Encoding { message }) => {
            format!("Not a UTF-8 text file: {}", message)
        }
        EditorError::File(FileError::Print { message }) => format!("Print failed: {}", message),
        EditorError::Buffer(BufferError::Utf8Boundary { position }) => {
            format!("Character boundary error at {}", position)
        }
        EditorError::Ui(UiError::TerminalInit) => "Terminal initialization failed".to_string(),
        EditorError::History(message) => format!("History replay failed: {}", message),
        _ => format!("Error: {}", error),
    }
}

/// パニックハンドラの設定
///
/// 端末を raw モードのまま残さないよう、既定のフックより先に復帰処理を行う
pub fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::DisableBracketedPaste,
            crossterm::terminal::LeaveAlternateScreen
        );

        let message: &str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "Unknown panic payload"
        };
        match panic_info.location() {
            Some(location) => {
                log::error!("PANIC at {}:{}: {}", location.file(), location.line(), message)
            }
            None => log::error!("PANIC: {}", message),
        }
        log::logger().flush();

        default_hook(panic_info);
    }));
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, EditorError>;

/// バッファ層のResult型
pub mod buffer {
    pub type Result<T> = std::result::Result<T, super::BufferError>;
}

impl From<std::io::Error> for EditorError {
    fn from(error: std::io::Error) -> Self {
        EditorError::File(FileError::Io {
            message: error.to_string(),
        })
    }
}

impl From<std::str::Utf8Error> for EditorError {
    fn from(error: std::str::Utf8Error) -> Self {
        EditorError::File(FileError::Encoding {
            message: format!("invalid UTF-8 at byte {}", error.valid_up_to()),
        })
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::InvalidFile {
            path: String::from("<json>"),
            message: error.to_string(),
        }
    }
}
