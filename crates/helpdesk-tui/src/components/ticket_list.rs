use crossterm::event::{KeyCode, KeyEvent};
use helpdesk_core::ticket::{
    RequestPriority, RequestStatus, Ticket, TicketFilter, TicketSort, SUMMARY_LEN,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// A filterable list of ticket cards.
///
/// Loads are tagged with a generation number; a result is only applied if
/// no newer load was started after it.
pub struct TicketList {
    tickets: Vec<Ticket>,
    list_state: ListState,
    filter: TicketFilter,
    error: Option<String>,
    generation: u64,
    empty_message: &'static str,
}

impl TicketList {
    pub fn new(empty_message: &'static str) -> Self {
        Self {
            tickets: Vec::new(),
            list_state: ListState::default(),
            filter: TicketFilter::default(),
            error: None,
            generation: 0,
            empty_message,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn filter(&self) -> TicketFilter {
        self.filter
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn empty_message(&self) -> &'static str {
        self.empty_message
    }

    pub fn selected(&self) -> Option<&Ticket> {
        self.tickets.get(self.list_state.selected()?)
    }

    /// Start a load and return its generation.
    pub fn begin_fetch(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Replace the tickets with a load result. Returns `false` (and changes
    /// nothing) if a newer load has been started since `generation`.
    pub fn apply(&mut self, generation: u64, tickets: Vec<Ticket>) -> bool {
        if generation != self.generation {
            return false;
        }
        let selected_id = self.selected().map(|t| t.id);
        self.tickets = tickets;
        self.error = None;
        let idx = selected_id
            .and_then(|id| self.tickets.iter().position(|t| t.id == id))
            .or((!self.tickets.is_empty()).then_some(0));
        self.list_state.select(idx);
        true
    }

    /// Record a failed load. The previous tickets stay on screen.
    pub fn fail(&mut self, generation: u64, message: String) -> bool {
        if generation != self.generation {
            return false;
        }
        self.error = Some(message);
        true
    }

    /// Filter keys. Returns `true` when the filter changed and the list
    /// needs a reload.
    pub fn handle_filter_key(&mut self, key: KeyEvent) -> bool {
        let before = self.filter;
        match key.code {
            KeyCode::Char('t') => self.filter.cycle_kind(),
            KeyCode::Char('s') => self.filter.cycle_status(),
            KeyCode::Char('p') => self.filter.cycle_priority(),
            KeyCode::Char('v') => self.filter.cycle_viewed(),
            KeyCode::Char('o') => self.filter.cycle_sort(),
            KeyCode::Char('c') => self.filter.clear(),
            _ => return false,
        }
        self.filter != before
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let len = self.tickets.len();
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if current + 1 < len {
                    self.list_state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if current > 0 {
                    self.list_state.select(Some(current - 1));
                }
            }
            KeyCode::Char('g') => self.list_state.select(Some(0)),
            KeyCode::Char('G') => self.list_state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, title: &str) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        frame.render_widget(self.filter_line(), layout[0]);

        let block = Block::default()
            .title(format!(" {title} ({}) ", self.tickets.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if let Some(ref err) = self.error {
            let inner = block.inner(layout[1]);
            frame.render_widget(block, layout[1]);
            let banner = Paragraph::new(format!("Error: {err}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(banner, inner);
            return;
        }

        if self.tickets.is_empty() {
            let empty = Paragraph::new(self.empty_message)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, layout[1]);
            return;
        }

        let items: Vec<ListItem> = self.tickets.iter().map(card).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, layout[1], &mut state);
    }

    fn filter_line(&self) -> Line<'static> {
        let f = self.filter;
        let parts = [
            ("t", "Type", f.kind.map_or("All", |k| k.label())),
            ("s", "Status", f.status.map_or("All", |s| s.label())),
            ("p", "Priority", f.priority.map_or("All", |p| p.label())),
            ("v", "Viewed", f.viewed_label()),
            ("o", "Sort", TicketSort::label(f.sort)),
        ];
        let mut spans = Vec::new();
        for (key, name, value) in parts {
            spans.push(Span::styled(
                format!(" {key}"),
                Style::default().fg(Color::Yellow).bold(),
            ));
            spans.push(Span::raw(format!(" {name}: ")));
            spans.push(Span::styled(value, Style::default().fg(Color::Cyan)));
        }
        Line::from(spans)
    }
}

fn card(ticket: &Ticket) -> ListItem<'static> {
    let mut header = vec![
        Span::styled(format!("#{} ", ticket.id), Style::default().bold()),
        Span::styled(
            format!("[{}] ", ticket.priority.label()),
            priority_style(ticket.priority),
        ),
        Span::raw(format!("{}  ", ticket.kind.label())),
        Span::styled(ticket.status.label(), status_style(ticket.status)),
    ];
    if ticket.is_new() {
        header.push(Span::styled(
            "  New",
            Style::default().fg(Color::Magenta).bold(),
        ));
    }

    let mut lines = vec![
        Line::from(header),
        Line::from(format!("  {}", ticket.summary(SUMMARY_LEN))),
    ];
    if let Some(created) = ticket.created_at {
        lines.push(Line::from(Span::styled(
            format!("  Created {}", created.format("%Y-%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    ListItem::new(lines)
}

pub fn priority_style(priority: RequestPriority) -> Style {
    match priority {
        RequestPriority::CanWait => Style::default().fg(Color::Green),
        RequestPriority::Middle => Style::default().fg(Color::Yellow),
        RequestPriority::Important => Style::default().fg(Color::Red).bold(),
        RequestPriority::Unknown(_) => Style::default().fg(Color::DarkGray),
    }
}

pub fn status_style(status: RequestStatus) -> Style {
    match status {
        RequestStatus::Pending => Style::default().fg(Color::Yellow),
        RequestStatus::InProcess => Style::default().fg(Color::Blue),
        RequestStatus::Done => Style::default().fg(Color::Green),
        RequestStatus::Unknown(_) => Style::default().fg(Color::DarkGray),
    }
}
