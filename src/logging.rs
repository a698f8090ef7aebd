//! ロギングシステム
//!
//! `log` ファサードのバックエンド。TUI が画面を占有するため出力先はファイル

use crate::config::{ensure_parent_dir, EditorOptions};
use crate::error::{ConfigError, EditorError, Result};
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// ファイルへ追記するロガー
#[derive(Debug)]
pub struct FileLogger {
    level: LevelFilter,
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLogger {
    pub fn open<P: Into<PathBuf>>(path: P, level: LevelFilter) -> std::io::Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            level,
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    fn format_line(record: &Record<'_>) -> String {
        format!(
            "{} {:<5} [{}] {}",
            timestamp_ms(),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format_line(record);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// 設定に従ってグローバルロガーを登録
///
/// ログファイルを決められない場合は何も出力しない。戻り値は実際の出力先
pub fn init(options: &EditorOptions) -> Result<Option<PathBuf>> {
    let level = options.resolve_log_level().map_err(EditorError::from)?;
    let Some(path) = options.resolve_log_path() else {
        return Ok(None);
    };
    if level == LevelFilter::Off {
        return Ok(None);
    }

    let logger = FileLogger::open(&path, level)?;
    log::set_boxed_logger(Box::new(logger)).map_err(|err| ConfigError::InvalidValue {
        key: "logger".to_string(),
        value: err.to_string(),
    })?;
    log::set_max_level(level);
    log::info!("tedit {} started", env!("CARGO_PKG_VERSION"));
    Ok(Some(path))
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_millis())
        .unwrap_or_default()
}
