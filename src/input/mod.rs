//! 入力処理

pub mod keybinding;

pub use keybinding::{command_for, Command};
