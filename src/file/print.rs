//! 印刷スプール
//!
//! 設定された外部コマンドの標準入力へ文書を渡す

use crate::error::{FileError, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// 印刷コマンドの既定値
pub const DEFAULT_PRINT_COMMAND: &str = "lpr";

/// 外部印刷コマンドへのスプーラ
#[derive(Debug, Clone)]
pub struct PrintSpooler {
    program: String,
    args: Vec<String>,
}

impl PrintSpooler {
    /// 空白区切りのコマンドラインから作成
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| FileError::Print {
            message: "print command is empty".to_string(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// 文書を印刷コマンドへ送る
    pub fn spool(&self, title: &str, content: &str) -> Result<()> {
        log::info!("spooling {:?} to {}", title, self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("TEDIT_PRINT_TITLE", title)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| print_error(format!("{}: {}", self.program, err)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(content.as_bytes()) {
                drop(stdin);
                // 子プロセスを回収してから失敗を返す
                let _ = child.kill();
                let _ = child.wait();
                return Err(print_error(format!("{}: {}", self.program, err)));
            }
        }

        let status = child.wait().map_err(|err| print_error(err.to_string()))?;
        if !status.success() {
            return Err(print_error(format!("{} exited with {}", self.program, status)));
        }
        Ok(())
    }
}

impl Default for PrintSpooler {
    fn default() -> Self {
        Self {
            program: DEFAULT_PRINT_COMMAND.to_string(),
            args: Vec::new(),
        }
    }
}

fn print_error(message: String) -> crate::error::EditorError {
    FileError::Print { message }.into()
}
