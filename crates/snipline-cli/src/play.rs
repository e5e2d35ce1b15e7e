//! Interactive playground: a scratch buffer with one live snippet.
//!
//! Every keystroke edits the buffer directly, exactly like an editor would,
//! and the snippet learns about it through an edit script of the change.

use std::io::Stdout;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span as TextSpan},
    widgets::{Block, Borders, Paragraph},
};
use snipline_engine::{
    ExpansionContext, Host, MemoryHost, NodeId, Position, SnippetInstance, Span, TextObject,
    compactify, content::end_from, edit_script,
};

pub struct App {
    host: MemoryHost,
    snippet: Option<SnippetInstance>,
    /// Text the next keystroke replaces, like a selected placeholder.
    selection: Option<Span>,
    status: String,
}

impl App {
    /// Expands `template` into an empty buffer and selects the first
    /// tabstop.
    pub fn new(template: &str, host: MemoryHost, ctx: ExpansionContext) -> Result<Self> {
        let mut host = host;
        let snippet = SnippetInstance::instantiate(&mut host, template, Position::default(), ctx)?;
        let mut app = Self {
            host,
            snippet: Some(snippet),
            selection: None,
            status: String::new(),
        };
        app.jump(false);
        Ok(app)
    }

    pub fn text(&self) -> String {
        self.host.text()
    }

    pub fn cursor(&self) -> Position {
        self.host.cursor()
    }

    pub fn selection(&self) -> Option<Span> {
        self.selection
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Handles one key. Returns `false` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc => return false,
            KeyCode::Tab => self.jump(false),
            KeyCode::BackTab => self.jump(true),
            KeyCode::Char(c) => self.type_text(&c.to_string()),
            KeyCode::Enter => self.type_text("\n"),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            _ => {}
        }
        true
    }

    fn jump(&mut self, backwards: bool) {
        let Some(snippet) = self.snippet.as_mut() else {
            return;
        };
        match snippet.select_next_tab(backwards) {
            Some(id) => self.select(id),
            None => self.finish("no tabstop to jump to"),
        }
    }

    fn select(&mut self, id: NodeId) {
        let Some(snippet) = self.snippet.as_ref() else {
            return;
        };
        let span = snippet.tree().node(id).span();
        self.host.set_cursor(span.end);
        self.selection = (!span.is_empty()).then_some(span);
        self.status = match snippet.active_tabstop() {
            Some(n) => format!("tabstop {n}"),
            None => "reached $0".to_string(),
        };
    }

    fn type_text(&mut self, text: &str) {
        let span = self
            .selection
            .take()
            .unwrap_or_else(|| Span::empty(self.host.cursor()));
        self.edit(span, text);
    }

    fn backspace(&mut self) {
        let span = match self.selection.take() {
            Some(span) => span,
            None => {
                let at = self.host.cursor();
                let start = if at.col > 0 {
                    Position::new(at.line, at.col - 1)
                } else if at.line > 0 {
                    let prev = self.host.line(at.line - 1).unwrap_or_default();
                    Position::new(at.line - 1, prev.chars().count())
                } else {
                    return;
                };
                Span::new(start, at)
            }
        };
        self.edit(span, "");
    }

    fn move_cursor(&mut self, delta: isize) {
        self.selection = None;
        let at = self.host.cursor();
        let len = self.host.line(at.line).unwrap_or_default().chars().count();
        let col = at.col.saturating_add_signed(delta).min(len);
        self.host.set_cursor(Position::new(at.line, col));
    }

    /// Writes `text` over `span`, leaves the cursor after it and replays
    /// the change into the snippet.
    fn edit(&mut self, span: Span, text: &str) {
        let before = self.host.text();
        self.host.write(span, text);
        self.host.set_cursor(end_from(span.start, text));
        let Some(snippet) = self.snippet.as_mut() else {
            return;
        };
        let commands = compactify(&edit_script(&before, &self.host.text()));
        if let Err(err) = snippet.apply(&mut self.host, &commands) {
            tracing::warn!(%err, "edit left the snippet");
            self.finish(&err.to_string());
        }
    }

    fn finish(&mut self, reason: &str) {
        self.snippet = None;
        self.selection = None;
        self.status = format!("snippet finished: {reason}");
    }

    fn tree_lines(&self) -> Vec<Line<'static>> {
        match &self.snippet {
            Some(snippet) => snippet.dump().lines().map(|l| Line::from(l.to_string())).collect(),
            None => vec![Line::from("no active snippet")],
        }
    }
}

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(KeyEvent { code, kind, .. }) = event::read()?
            && kind == KeyEventKind::Press
            && !app.handle_key(code)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(rows[0]);

    let text = app.text();
    let buffer: Vec<Line> = text.split('\n').map(|l| Line::from(l.to_string())).collect();
    let buffer = Paragraph::new(buffer).block(Block::default().borders(Borders::ALL).title("Buffer"));
    f.render_widget(buffer, panes[0]);

    let tree = Paragraph::new(app.tree_lines())
        .block(Block::default().borders(Borders::ALL).title("Snippet"));
    f.render_widget(tree, panes[1]);

    let selection = match app.selection() {
        Some(span) => format!("selected {span} | "),
        None => String::new(),
    };
    let help = Line::from(vec![
        TextSpan::styled(
            format!("{selection}{} ", app.status()),
            Style::default().fg(Color::Yellow),
        ),
        TextSpan::raw("| Tab: next | Shift-Tab: previous | Esc: quit"),
    ]);
    f.render_widget(Paragraph::new(vec![help]).block(Block::default()), rows[1]);

    let cursor = app.cursor();
    f.set_cursor_position((
        panes[0].x + 1 + cursor.col as u16,
        panes[0].y + 1 + cursor.line as u16,
    ));
}
