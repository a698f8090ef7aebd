//! キーバインド
//!
//! crossterm のキーイベントをエディタコマンドへ変換する

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// エディタコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    InsertChar(char),
    Newline,
    Backspace,
    DeleteForward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    LineStart,
    LineEnd,
    ToggleMark,
    New,
    Open,
    Save,
    SaveAs,
    Print,
    Cut,
    Copy,
    Paste,
    Undo,
    Redo,
    Close,
    Cancel,
}

impl Command {
    /// 文書内容を変更しうるコマンドか
    pub fn is_edit(self) -> bool {
        matches!(
            self,
            Command::InsertChar(_)
                | Command::Newline
                | Command::Backspace
                | Command::DeleteForward
                | Command::Cut
                | Command::Paste
                | Command::Undo
                | Command::Redo
        )
    }
}

/// キーイベントに対応するコマンド
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        return match key.code {
            KeyCode::Char(' ') | KeyCode::Char('@') => Some(Command::ToggleMark),
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'n' => Some(Command::New),
                'o' => Some(Command::Open),
                's' if key.modifiers.contains(KeyModifiers::SHIFT) || c == 'S' => Some(Command::SaveAs),
                's' => Some(Command::Save),
                'p' => Some(Command::Print),
                'x' => Some(Command::Cut),
                'c' => Some(Command::Copy),
                'v' => Some(Command::Paste),
                'z' => Some(Command::Undo),
                'y' => Some(Command::Redo),
                'q' => Some(Command::Close),
                'g' => Some(Command::Cancel),
                'a' => Some(Command::LineStart),
                'e' => Some(Command::LineEnd),
                _ => None,
            },
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(c) if !alt => Some(Command::InsertChar(c)),
        KeyCode::Tab => Some(Command::InsertChar('\t')),
        KeyCode::Enter => Some(Command::Newline),
        KeyCode::Backspace => Some(Command::Backspace),
        KeyCode::Delete => Some(Command::DeleteForward),
        KeyCode::Left => Some(Command::MoveLeft),
        KeyCode::Right => Some(Command::MoveRight),
        KeyCode::Up => Some(Command::MoveUp),
        KeyCode::Down => Some(Command::MoveDown),
        KeyCode::Home => Some(Command::LineStart),
        KeyCode::End => Some(Command::LineEnd),
        KeyCode::Esc => Some(Command::Cancel),
        _ => None,
    }
}
