//! ファイルI/O操作
//!
//! UTF-8テキストファイルの読み込み・保存と印刷の受け渡し

pub mod print;

pub use print::PrintSpooler;

use crate::error::{EditorError, FileError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// `~` や環境変数を展開してパスに変換
pub fn expand_path(input: &str) -> Result<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FileError::InvalidPath {
            path: input.to_string(),
        }
        .into());
    }
    let expanded = shellexpand::full(trimmed).map_err(|err| FileError::InvalidPath {
        path: format!("{}: {}", trimmed, err),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// ファイルからテキストを読み込み
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    if path.is_dir() {
        return Err(FileError::InvalidPath {
            path: path.display().to_string(),
        }
        .into());
    }

    let bytes = fs::read(path).map_err(|err| io_error(path, err))?;
    let text = String::from_utf8(bytes).map_err(|err| EditorError::from(err.utf8_error()))?;
    log::info!("read {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

/// テキストをファイルに書き込み
///
/// 一時ファイルへ書いてからリネームするため、途中で失敗しても元のファイルは壊れない
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, err))?;
        }
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content).map_err(|err| io_error(&temp_path, err))?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error(path, err));
    }

    log::info!("wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// ステータス表示用のファイル名
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tedit-tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, err: std::io::Error) -> EditorError {
    let path = path.display().to_string();
    let file_error = match err.kind() {
        ErrorKind::NotFound => FileError::NotFound { path },
        ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
        _ => FileError::Io {
            message: format!("{}: {}", path, err),
        },
    };
    file_error.into()
}
