//! The two role-specific dashboards.
//!
//! Each handler takes the service by reference and reports back to the app
//! through [`Flow`]; a 401 anywhere becomes `Flow::Expired`.

use crossterm::event::{KeyCode, KeyEvent};
use helpdesk_core::form::TicketDraft;
use helpdesk_core::stats::TicketStats;
use helpdesk_core::ticket::{status_transition, RequestStatus, Ticket, TicketFilter};
use helpdesk_core::user::ClientSummary;
use helpdesk_service::{BlockingHttpService, ServiceError};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use tracing::debug;

use crate::components::draft_editor::{DraftEditor, EditorEvent};
use crate::components::ticket_list::{priority_style, status_style, TicketList};

pub const CLIENT_EMPTY: &str = "No requests found. Create your first request!";
pub const SUPPORT_EMPTY: &str = "No requests found.";

/// What the app should do after a dashboard handled a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Stay,
    Notice(String),
    Logout,
    Expired,
}

/// Reload `list` with its current filter through `fetch`.
fn reload(
    list: &mut TicketList,
    fetch: impl FnOnce(&TicketFilter) -> Result<Vec<Ticket>, ServiceError>,
) -> Flow {
    let generation = list.begin_fetch();
    let filter = list.filter();
    debug!(generation, ?filter, "loading tickets");
    match fetch(&filter) {
        Ok(tickets) => {
            list.apply(generation, tickets);
            Flow::Stay
        }
        Err(e) if e.is_unauthorized() => Flow::Expired,
        Err(e) => {
            list.fail(generation, e.user_message());
            Flow::Stay
        }
    }
}

// ---- Client ----

pub enum ClientDialog {
    Create(DraftEditor),
    Detail(ClientDetail),
}

pub struct ClientDetail {
    ticket: Ticket,
    editor: Option<DraftEditor>,
    error: Option<String>,
}

impl ClientDetail {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn editor(&self) -> Option<&DraftEditor> {
        self.editor.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub struct ClientDashboard {
    list: TicketList,
    dialog: Option<ClientDialog>,
}

impl ClientDashboard {
    /// Build the dashboard and load the first page of tickets.
    pub fn open(service: &BlockingHttpService) -> (Self, Flow) {
        let mut dash = Self {
            list: TicketList::new(CLIENT_EMPTY),
            dialog: None,
        };
        let flow = dash.refresh(service);
        (dash, flow)
    }

    pub fn list(&self) -> &TicketList {
        &self.list
    }

    pub fn dialog(&self) -> Option<&ClientDialog> {
        self.dialog.as_ref()
    }

    pub fn is_input_mode(&self) -> bool {
        match &self.dialog {
            Some(ClientDialog::Create(_)) => true,
            Some(ClientDialog::Detail(detail)) => detail.editor.is_some(),
            None => false,
        }
    }

    fn refresh(&mut self, service: &BlockingHttpService) -> Flow {
        reload(&mut self.list, |f| service.list_my_tickets(f))
    }

    pub fn handle_key(&mut self, key: KeyEvent, service: &BlockingHttpService) -> Flow {
        match self.dialog.take() {
            None => self.handle_list(key, service),
            Some(ClientDialog::Create(editor)) => self.handle_create(key, editor, service),
            Some(ClientDialog::Detail(detail)) => self.handle_detail(key, detail, service),
        }
    }

    fn handle_list(&mut self, key: KeyEvent, service: &BlockingHttpService) -> Flow {
        if self.list.handle_filter_key(key) {
            return self.refresh(service);
        }
        match key.code {
            KeyCode::Char('n') => {
                self.dialog = Some(ClientDialog::Create(DraftEditor::new(
                    TicketDraft::default(),
                )));
                Flow::Stay
            }
            KeyCode::Char('r') => self.refresh(service),
            KeyCode::Char('L') => Flow::Logout,
            KeyCode::Enter => {
                let Some(id) = self.list.selected().map(|t| t.id) else {
                    return Flow::Stay;
                };
                match service.get_my_ticket(id) {
                    Ok(ticket) => {
                        self.dialog = Some(ClientDialog::Detail(ClientDetail {
                            ticket,
                            editor: None,
                            error: None,
                        }));
                        Flow::Stay
                    }
                    Err(e) if e.is_unauthorized() => Flow::Expired,
                    Err(e) => Flow::Notice(e.user_message()),
                }
            }
            _ => {
                self.list.handle_key(key);
                Flow::Stay
            }
        }
    }

    fn handle_create(
        &mut self,
        key: KeyEvent,
        mut editor: DraftEditor,
        service: &BlockingHttpService,
    ) -> Flow {
        match editor.handle_key(key) {
            EditorEvent::Cancel => Flow::Stay,
            EditorEvent::Continue => {
                self.dialog = Some(ClientDialog::Create(editor));
                Flow::Stay
            }
            EditorEvent::Submit => {
                let input = match editor.draft().validate() {
                    Ok(input) => input,
                    Err(e) => {
                        editor.set_error(e.to_string());
                        self.dialog = Some(ClientDialog::Create(editor));
                        return Flow::Stay;
                    }
                };
                match service.create_ticket(&input) {
                    Ok(ticket) => {
                        debug!(id = ticket.id, "ticket created");
                        match self.refresh(service) {
                            Flow::Stay => Flow::Notice("Request created".into()),
                            other => other,
                        }
                    }
                    Err(e) if e.is_unauthorized() => Flow::Expired,
                    Err(e) => {
                        editor.set_error(e.user_message());
                        self.dialog = Some(ClientDialog::Create(editor));
                        Flow::Stay
                    }
                }
            }
        }
    }

    fn handle_detail(
        &mut self,
        key: KeyEvent,
        mut detail: ClientDetail,
        service: &BlockingHttpService,
    ) -> Flow {
        let Some(mut editor) = detail.editor.take() else {
            match key.code {
                KeyCode::Esc => return Flow::Stay,
                KeyCode::Char('e') => {
                    let draft = TicketDraft::from_ticket(&detail.ticket);
                    detail.editor = Some(DraftEditor::new(draft));
                    detail.error = None;
                }
                _ => {}
            }
            self.dialog = Some(ClientDialog::Detail(detail));
            return Flow::Stay;
        };

        let flow = match editor.handle_key(key) {
            EditorEvent::Cancel => Flow::Stay,
            EditorEvent::Continue => {
                detail.editor = Some(editor);
                Flow::Stay
            }
            EditorEvent::Submit => match editor.draft().validate() {
                Err(e) => {
                    editor.set_error(e.to_string());
                    detail.editor = Some(editor);
                    Flow::Stay
                }
                Ok(input) => match service.update_ticket(detail.ticket.id, &input) {
                    Ok(updated) => {
                        match service.get_my_ticket(detail.ticket.id) {
                            Ok(ticket) => detail.ticket = ticket,
                            Err(e) if e.is_unauthorized() => return Flow::Expired,
                            Err(e) => {
                                // Saved; only the re-read failed.
                                detail.ticket = updated;
                                detail.error = Some(e.user_message());
                            }
                        }
                        self.refresh(service)
                    }
                    Err(e) if e.is_unauthorized() => return Flow::Expired,
                    Err(e) => {
                        editor.set_error(e.user_message());
                        detail.editor = Some(editor);
                        Flow::Stay
                    }
                },
            },
        };
        self.dialog = Some(ClientDialog::Detail(detail));
        flow
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        self.list.render(frame, area, "My Requests");

        match &self.dialog {
            None => {}
            Some(ClientDialog::Create(editor)) => {
                editor.render(frame, centered_rect(60, 50, area), "New Request")
            }
            Some(ClientDialog::Detail(detail)) => match &detail.editor {
                Some(editor) => editor.render(
                    frame,
                    centered_rect(60, 50, area),
                    &format!("Edit Request #{}", detail.ticket.id),
                ),
                None => render_ticket_detail(
                    frame,
                    &detail.ticket,
                    detail.error.as_deref(),
                    None,
                    centered_rect(60, 60, area),
                ),
            },
        }
    }

    pub fn hints(&self) -> Vec<(&'static str, &'static str)> {
        match &self.dialog {
            None => vec![
                ("q", "quit"),
                ("j/k", "nav"),
                ("Enter", "detail"),
                ("n", "new"),
                ("t/s/p/v", "filter"),
                ("o", "sort"),
                ("c", "clear"),
                ("r", "reload"),
                ("L", "logout"),
            ],
            Some(ClientDialog::Detail(ClientDetail { editor: None, .. })) => {
                vec![("e", "edit"), ("Esc", "close")]
            }
            Some(_) => vec![
                ("Tab", "field"),
                ("←/→", "choose"),
                ("Enter", "save"),
                ("Esc", "cancel"),
            ],
        }
    }
}

// ---- Support ----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportTab {
    Requests,
    Clients,
}

pub struct SupportDetail {
    ticket: Ticket,
    error: Option<String>,
}

impl SupportDetail {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub struct SupportDashboard {
    list: TicketList,
    tab: SupportTab,
    clients: Vec<ClientSummary>,
    clients_state: ListState,
    clients_error: Option<String>,
    detail: Option<SupportDetail>,
}

impl SupportDashboard {
    pub fn open(service: &BlockingHttpService) -> (Self, Flow) {
        let mut dash = Self {
            list: TicketList::new(SUPPORT_EMPTY),
            tab: SupportTab::Requests,
            clients: Vec::new(),
            clients_state: ListState::default(),
            clients_error: None,
            detail: None,
        };
        let flow = dash.refresh(service);
        (dash, flow)
    }

    pub fn list(&self) -> &TicketList {
        &self.list
    }

    pub fn tab(&self) -> SupportTab {
        self.tab
    }

    pub fn clients(&self) -> &[ClientSummary] {
        &self.clients
    }

    pub fn detail(&self) -> Option<&SupportDetail> {
        self.detail.as_ref()
    }

    pub fn stats(&self) -> TicketStats {
        TicketStats::from_tickets(self.list.tickets())
    }

    fn refresh(&mut self, service: &BlockingHttpService) -> Flow {
        reload(&mut self.list, |f| service.list_all_tickets(f))
    }

    fn load_clients(&mut self, service: &BlockingHttpService) -> Flow {
        match service.list_clients() {
            Ok(clients) => {
                self.clients_state.select((!clients.is_empty()).then_some(0));
                self.clients = clients;
                self.clients_error = None;
                Flow::Stay
            }
            Err(e) if e.is_unauthorized() => Flow::Expired,
            Err(e) => {
                self.clients_error = Some(e.user_message());
                Flow::Stay
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, service: &BlockingHttpService) -> Flow {
        if let Some(detail) = self.detail.take() {
            return self.handle_detail(key, detail, service);
        }
        match (key.code, self.tab) {
            (KeyCode::Char('L'), _) => Flow::Logout,
            (KeyCode::Tab, SupportTab::Requests) => {
                self.tab = SupportTab::Clients;
                self.load_clients(service)
            }
            (KeyCode::Tab, SupportTab::Clients) => {
                self.tab = SupportTab::Requests;
                self.refresh(service)
            }
            (KeyCode::Char('r'), SupportTab::Requests) => self.refresh(service),
            (KeyCode::Char('r'), SupportTab::Clients) => self.load_clients(service),
            (KeyCode::Enter, SupportTab::Requests) => {
                let Some(id) = self.list.selected().map(|t| t.id) else {
                    return Flow::Stay;
                };
                self.open_detail(id, service)
            }
            (_, SupportTab::Requests) => {
                if self.list.handle_filter_key(key) {
                    return self.refresh(service);
                }
                self.list.handle_key(key);
                Flow::Stay
            }
            (KeyCode::Char('j') | KeyCode::Down, SupportTab::Clients) => {
                let next = self.clients_state.selected().map_or(0, |i| i + 1);
                if next < self.clients.len() {
                    self.clients_state.select(Some(next));
                }
                Flow::Stay
            }
            (KeyCode::Char('k') | KeyCode::Up, SupportTab::Clients) => {
                let current = self.clients_state.selected().unwrap_or(0);
                self.clients_state.select(Some(current.saturating_sub(1)));
                Flow::Stay
            }
            _ => Flow::Stay,
        }
    }

    /// Fetching through the support endpoint marks the ticket viewed, so
    /// the list is reloaded right after.
    fn open_detail(&mut self, id: i64, service: &BlockingHttpService) -> Flow {
        match service.get_ticket_for_support(id) {
            Ok(ticket) => {
                self.detail = Some(SupportDetail {
                    ticket,
                    error: None,
                });
                self.refresh(service)
            }
            Err(e) if e.is_unauthorized() => Flow::Expired,
            Err(e) => Flow::Notice(e.user_message()),
        }
    }

    fn handle_detail(
        &mut self,
        key: KeyEvent,
        mut detail: SupportDetail,
        service: &BlockingHttpService,
    ) -> Flow {
        let target = match key.code {
            KeyCode::Esc => return Flow::Stay,
            KeyCode::Char('1') => RequestStatus::Pending,
            KeyCode::Char('2') => RequestStatus::InProcess,
            KeyCode::Char('3') => RequestStatus::Done,
            _ => {
                self.detail = Some(detail);
                return Flow::Stay;
            }
        };

        let Some(status) = status_transition(detail.ticket.status, target) else {
            self.detail = Some(detail);
            return Flow::Stay;
        };

        let flow = match service.update_ticket_status(detail.ticket.id, status) {
            Ok(updated) => {
                match service.get_ticket_for_support(detail.ticket.id) {
                    Ok(ticket) => {
                        detail.ticket = ticket;
                        detail.error = None;
                    }
                    Err(e) if e.is_unauthorized() => return Flow::Expired,
                    Err(e) => {
                        detail.ticket = updated;
                        detail.error = Some(e.user_message());
                    }
                }
                self.refresh(service)
            }
            Err(e) if e.is_unauthorized() => return Flow::Expired,
            Err(e) => {
                detail.error = Some(e.user_message());
                Flow::Stay
            }
        };
        self.detail = Some(detail);
        flow
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        self.render_stats(frame, layout[0]);

        match self.tab {
            SupportTab::Requests => self.list.render(frame, layout[1], "All Requests"),
            SupportTab::Clients => self.render_clients(frame, layout[1]),
        }

        if let Some(ref detail) = self.detail {
            render_ticket_detail(
                frame,
                &detail.ticket,
                detail.error.as_deref(),
                Some(detail.ticket.status),
                centered_rect(60, 60, area),
            );
        }
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let stats = self.stats();
        let tab = |tab: SupportTab, label: &'static str| {
            if self.tab == tab {
                Span::styled(label, Style::default().fg(Color::Black).bg(Color::Cyan).bold())
            } else {
                Span::styled(label, Style::default().fg(Color::DarkGray))
            }
        };
        let lines = vec![
            Line::from(vec![
                tab(SupportTab::Requests, " All Requests "),
                Span::raw(" "),
                tab(SupportTab::Clients, " Clients "),
            ]),
            Line::from(vec![
                Span::styled(" Pending ", status_style(RequestStatus::Pending)),
                Span::raw(format!("{}  ", stats.pending)),
                Span::styled("In Process ", status_style(RequestStatus::InProcess)),
                Span::raw(format!("{}  ", stats.in_process)),
                Span::styled("Done ", status_style(RequestStatus::Done)),
                Span::raw(format!("{}  ", stats.done)),
                Span::styled("Unviewed ", Style::default().fg(Color::Magenta)),
                Span::raw(stats.unviewed.to_string()),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_clients(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Clients ({}) ", self.clients.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if let Some(ref err) = self.clients_error {
            let banner = Paragraph::new(format!("Error: {err}"))
                .style(Style::default().fg(Color::Red))
                .block(block);
            frame.render_widget(banner, area);
            return;
        }

        let items: Vec<ListItem> = self
            .clients
            .iter()
            .map(|c| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<24}", c.name), Style::default().bold()),
                    Span::raw(format!("{:<32}", c.email)),
                    Span::styled(c.role.label(), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("> ");
        let mut state = self.clients_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }

    pub fn hints(&self) -> Vec<(&'static str, &'static str)> {
        if self.detail.is_some() {
            return vec![
                ("1", "pending"),
                ("2", "in process"),
                ("3", "done"),
                ("Esc", "close"),
            ];
        }
        match self.tab {
            SupportTab::Requests => vec![
                ("q", "quit"),
                ("j/k", "nav"),
                ("Enter", "open"),
                ("t/s/p/v", "filter"),
                ("o", "sort"),
                ("c", "clear"),
                ("Tab", "clients"),
                ("L", "logout"),
            ],
            SupportTab::Clients => vec![
                ("q", "quit"),
                ("j/k", "nav"),
                ("Tab", "requests"),
                ("r", "reload"),
                ("L", "logout"),
            ],
        }
    }
}

// ---- Shared rendering ----

/// Full ticket view. With `actions`, the status buttons are drawn and the
/// one matching the current status is greyed out.
fn render_ticket_detail(
    frame: &mut Frame,
    ticket: &Ticket,
    error: Option<&str>,
    actions: Option<RequestStatus>,
    area: Rect,
) {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" Request #{} ", ticket.id))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let field = |name: &'static str| Span::styled(name, Style::default().bold());
    let mut lines = vec![
        Line::from(vec![field("Type:     "), Span::raw(ticket.kind.label())]),
        Line::from(vec![
            field("Priority: "),
            Span::styled(ticket.priority.label(), priority_style(ticket.priority)),
        ]),
        Line::from(vec![
            field("Status:   "),
            Span::styled(ticket.status.label(), status_style(ticket.status)),
        ]),
        Line::from(vec![
            field("Viewed:   "),
            Span::raw(if ticket.viewed { "Yes" } else { "No" }),
        ]),
    ];
    if let Some(created) = ticket.created_at {
        lines.push(Line::from(vec![
            field("Created:  "),
            Span::raw(created.format("%Y-%m-%d %H:%M").to_string()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(ticket.request.clone()));

    if let Some(current) = actions {
        lines.push(Line::from(""));
        let mut spans = Vec::new();
        for (key, status) in [
            ("1", RequestStatus::Pending),
            ("2", RequestStatus::InProcess),
            ("3", RequestStatus::Done),
        ] {
            let style = if status_transition(current, status).is_some() {
                status_style(status).bold()
            } else {
                Style::default().fg(Color::DarkGray).crossed_out()
            };
            spans.push(Span::styled(format!("[{key}] {}", status.label()), style));
            spans.push(Span::raw("  "));
        }
        lines.push(Line::from(spans));
    }

    if let Some(err) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
