//! エディタ設定
//!
//! 既定値 < 設定ファイル（JSON）< コマンドライン引数 の順に上書きする

use crate::error::ConfigError;
use crate::file::print::DEFAULT_PRINT_COMMAND;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_DIR_NAME: &str = "tedit";
const CONFIG_FILE_NAME: &str = "config.json";

/// エディタ動作のオプション
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorOptions {
    /// デバッグログ出力先（未指定時は `~/.tedit-log/debug.log`）
    pub debug_log_path: Option<PathBuf>,
    /// ログレベル（off/error/warn/info/debug/trace）
    pub log_level: Option<String>,
    /// 印刷コマンド（未指定時は `lpr`）
    pub print_command: Option<String>,
    /// 起動時に開くファイルパス
    #[serde(skip)]
    pub initial_file: Option<PathBuf>,
}

impl EditorOptions {
    /// 設定ファイルを読み込む
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::InvalidFile {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_json(&text).map_err(|err| match err {
            ConfigError::InvalidFile { message, .. } => ConfigError::InvalidFile {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let options: EditorOptions = serde_json::from_str(text)?;
        options.resolve_log_level()?;
        Ok(options)
    }

    /// 既定の場所の設定ファイルを読む。存在しなければ既定値
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn resolve_log_path(&self) -> Option<PathBuf> {
        match &self.debug_log_path {
            Some(path) => Some(expand_tilde(path)),
            None => default_log_path(),
        }
    }

    pub fn resolve_log_level(&self) -> Result<LevelFilter, ConfigError> {
        match &self.log_level {
            None => Ok(LevelFilter::Info),
            Some(value) => LevelFilter::from_str(value).map_err(|_| ConfigError::InvalidValue {
                key: "log_level".to_string(),
                value: value.clone(),
            }),
        }
    }

    pub fn print_command(&self) -> &str {
        self.print_command
            .as_deref()
            .unwrap_or(DEFAULT_PRINT_COMMAND)
    }

    /// `overrides` 側で指定された値を優先して合成
    pub fn merged_with(&self, overrides: &EditorOptions) -> EditorOptions {
        EditorOptions {
            debug_log_path: overrides
                .debug_log_path
                .clone()
                .or_else(|| self.debug_log_path.clone()),
            log_level: overrides
                .log_level
                .clone()
                .or_else(|| self.log_level.clone()),
            print_command: overrides
                .print_command
                .clone()
                .or_else(|| self.print_command.clone()),
            initial_file: overrides
                .initial_file
                .clone()
                .or_else(|| self.initial_file.clone()),
        }
    }
}

/// コマンドライン引数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// 引数で指定された上書き値
    pub overrides: EditorOptions,
    /// `--config` で指定された設定ファイル
    pub config_path: Option<PathBuf>,
    pub show_help: bool,
}

impl CliArgs {
    /// `tedit [FILE] [--config PATH] [--debug-log PATH] [--log-level LEVEL] [--print-command CMD]`
    pub fn parse<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = CliArgs::default();
        let mut iter = args.into_iter().map(Into::into);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.show_help = true,
                "--config" => parsed.config_path = Some(PathBuf::from(require(&mut iter, &arg)?)),
                "--debug-log" => {
                    parsed.overrides.debug_log_path = Some(PathBuf::from(require(&mut iter, &arg)?))
                }
                "--log-level" => parsed.overrides.log_level = Some(require(&mut iter, &arg)?),
                "--print-command" => parsed.overrides.print_command = Some(require(&mut iter, &arg)?),
                flag if flag.starts_with('-') => {
                    return Err(ConfigError::InvalidValue {
                        key: "argument".to_string(),
                        value: flag.to_string(),
                    })
                }
                path => parsed.overrides.initial_file = Some(PathBuf::from(path)),
            }
        }

        parsed.overrides.resolve_log_level()?;
        Ok(parsed)
    }

    /// 設定ファイルを読み込み、引数の値で上書きした最終設定
    pub fn resolve(&self) -> Result<EditorOptions, ConfigError> {
        let base = match &self.config_path {
            Some(path) => EditorOptions::load_from(path)?,
            None => EditorOptions::load_default()?,
        };
        Ok(base.merged_with(&self.overrides))
    }
}

pub const USAGE: &str = "usage: tedit [FILE] [--config PATH] [--debug-log PATH] [--log-level LEVEL] [--print-command CMD]";

fn require(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
    iter.next().ok_or_else(|| ConfigError::InvalidValue {
        key: flag.to_string(),
        value: "<missing>".to_string(),
    })
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tedit-log").join("debug.log"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => PathBuf::from(shellexpand::tilde(text).into_owned()),
        None => path.to_path_buf(),
    }
}

/// ヘルパー：親ディレクトリを作成
pub(crate) fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
