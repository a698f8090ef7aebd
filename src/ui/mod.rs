//! UIモジュール
//!
//! ratatui で文書・ステータス行・プロンプト行を描画する

pub mod viewport;

pub use viewport::Viewport;

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

/// タブの表示幅
pub const TAB_WIDTH: usize = 4;

/// 1文書分の描画を担当する
#[derive(Debug, Default)]
pub struct Renderer {
    viewport: Viewport,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>, app: &App) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
            .split(frame.area());

        let text_cursor = self.render_text_area(frame, chunks[0], app);
        render_status_line(frame, chunks[1], app);
        let prompt_cursor = render_message_line(frame, chunks[2], app);

        if let Some(position) = prompt_cursor.or(text_cursor) {
            frame.set_cursor_position(position);
        }
    }

    fn render_text_area(&mut self, frame: &mut Frame<'_>, area: Rect, app: &App) -> Option<Position> {
        let document = app.editor().document();
        let lines = document.lines();
        let (cursor_line, cursor_column) = document.cursor_line_column();
        let cursor_x = lines
            .get(cursor_line)
            .map(|line| display_width(line.chars().take(cursor_column)))
            .unwrap_or(0);

        self.viewport
            .set_dimensions(area.height as usize, area.width as usize);
        self.viewport.ensure_visible(cursor_line, cursor_x);

        let selection = document.selection();
        let top = self.viewport.top_line();
        let mut line_start: usize = lines
            .iter()
            .take(top)
            .map(|line| line.chars().count() + 1)
            .sum();

        let mut visible = Vec::with_capacity(self.viewport.height());
        for line in lines.iter().skip(top).take(self.viewport.height()) {
            visible.push(styled_line(line, line_start, selection));
            line_start += line.chars().count() + 1;
        }

        let scroll_x = self.viewport.scroll_x();
        let paragraph = Paragraph::new(visible).scroll((0, scroll_x.min(u16::MAX as usize) as u16));
        frame.render_widget(paragraph, area);

        if app.prompt().is_some() {
            return None;
        }
        let x = area.x as usize + cursor_x.saturating_sub(scroll_x);
        let y = area.y as usize + cursor_line.saturating_sub(top);
        Some(Position::new(x as u16, y as u16))
    }
}

fn render_status_line(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let editor = app.editor();
    let (line, column) = editor.document().cursor_line_column();
    let history = editor.history();
    let status = format!(
        " {}{}  L{}:C{}  undo:{} redo:{}{}",
        editor.display_name(),
        if editor.is_modified() { " [+]" } else { "" },
        line + 1,
        column + 1,
        history.undo_len(),
        history.redo_len(),
        if editor.document().mark().is_some() { "  [mark]" } else { "" },
    );

    let paragraph = Paragraph::new(status).style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::Gray)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(paragraph, area);
}

/// プロンプト入力中ならカーソル位置を返す
fn render_message_line(frame: &mut Frame<'_>, area: Rect, app: &App) -> Option<Position> {
    if let Some(prompt) = app.prompt() {
        let label = prompt.kind.label();
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Cyan)),
            Span::raw(prompt.input.clone()),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let width = display_width(label.chars()) + display_width(prompt.input.chars());
        let x = (area.x as usize + width).min((area.x + area.width.saturating_sub(1)) as usize);
        return Some(Position::new(x as u16, area.y));
    }

    if let Some(message) = app.message() {
        let style = if message.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        frame.render_widget(Paragraph::new(Line::from(message.text.clone()).style(style)), area);
    }
    None
}

/// 1行分を選択範囲つきの `Line` に変換する
fn styled_line(line: &str, line_start: usize, selection: Option<(usize, usize)>) -> Line<'static> {
    let highlight = Style::default().add_modifier(Modifier::REVERSED);
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_selected = false;
    let mut column = 0;

    for (offset, ch) in line.chars().enumerate() {
        let position = line_start + offset;
        let selected = selection.is_some_and(|(start, end)| start <= position && position < end);
        if selected != current_selected && !current.is_empty() {
            spans.push(span_for(std::mem::take(&mut current), current_selected, highlight));
        }
        current_selected = selected;
        push_display(&mut current, ch, column);
        column += char_width(ch, column);
    }
    if !current.is_empty() {
        spans.push(span_for(current, current_selected, highlight));
    }

    // 選択範囲が改行を含むときは行末に印を出す
    let newline = line_start + line.chars().count();
    if selection.is_some_and(|(start, end)| start <= newline && newline < end) {
        spans.push(Span::styled(" ", highlight));
    }

    Line::from(spans)
}

fn span_for(text: String, selected: bool, highlight: Style) -> Span<'static> {
    if selected {
        Span::styled(text, highlight)
    } else {
        Span::raw(text)
    }
}

fn push_display(out: &mut String, ch: char, column: usize) {
    if ch == '\t' {
        out.extend(std::iter::repeat(' ').take(char_width(ch, column)));
    } else if ch.is_control() {
        out.push('?');
    } else {
        out.push(ch);
    }
}

fn char_width(ch: char, column: usize) -> usize {
    match ch {
        '\t' => TAB_WIDTH - column % TAB_WIDTH,
        c if c.is_control() => 1,
        c => c.width().unwrap_or(0),
    }
}

/// 文字列の表示幅（タブ展開込み）
pub fn display_width(chars: impl Iterator<Item = char>) -> usize {
    chars.fold(0, |column, ch| column + char_width(ch, column))
}
