use crossterm::event::{KeyCode, KeyEvent};
use helpdesk_core::form::{LoginForm, SignupForm};
use helpdesk_core::user::{Role, User};
use helpdesk_service::BlockingHttpService;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{error, info, warn};

use crate::dashboard::{centered_rect, ClientDashboard, Flow, SupportDashboard};

pub const SESSION_EXPIRED: &str = "Session expired, please log in again";
pub const CRASH_MESSAGE: &str = "Something went wrong. Press r to reload or q to quit.";

/// Which screen the app is showing
pub enum Screen {
    Login {
        form: LoginForm,
        field: LoginField,
        error: Option<String>,
    },
    Signup {
        form: SignupForm,
        field: SignupField,
        error: Option<String>,
    },
    Dashboard(Dashboard),
    /// A panic was caught while handling a key or drawing
    Crashed { message: String },
}

impl Screen {
    fn login(error: Option<String>) -> Self {
        Screen::Login {
            form: LoginForm::default(),
            field: LoginField::Email,
            error,
        }
    }
}

pub enum Dashboard {
    Client(ClientDashboard),
    Support(SupportDashboard),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Name,
    Email,
    Password,
}

impl SignupField {
    fn next(self) -> Self {
        match self {
            SignupField::Name => SignupField::Email,
            SignupField::Email => SignupField::Password,
            SignupField::Password => SignupField::Name,
        }
    }

    fn prev(self) -> Self {
        match self {
            SignupField::Name => SignupField::Password,
            SignupField::Email => SignupField::Name,
            SignupField::Password => SignupField::Email,
        }
    }
}

pub struct App {
    service: BlockingHttpService,
    screen: Screen,
    status_message: Option<String>,
}

impl App {
    /// Build the app and pick the first screen from the stored session.
    pub fn new(service: BlockingHttpService) -> Self {
        let mut app = Self {
            service,
            screen: Screen::login(None),
            status_message: None,
        };
        app.start();
        app
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// A stored session is checked against `/auth/me`. If the server can't
    /// be reached the stored user is trusted and the error is shown.
    fn start(&mut self) {
        let Some(stored) = self.service.session().user() else {
            self.screen = Screen::login(None);
            return;
        };
        match self.service.current_user() {
            Ok(user) => self.enter_dashboard(&user),
            Err(e) if e.is_unauthorized() => self.expire(),
            Err(e) => {
                warn!("could not verify stored session: {e}");
                self.enter_dashboard(&stored);
                self.status_message = Some(e.user_message());
            }
        }
    }

    fn enter_dashboard(&mut self, user: &User) {
        info!(user = %user.email, role = %user.role, "opening dashboard");
        let flow = match user.role {
            Role::Client => {
                let (dash, flow) = ClientDashboard::open(&self.service);
                self.screen = Screen::Dashboard(Dashboard::Client(dash));
                flow
            }
            Role::Support => {
                let (dash, flow) = SupportDashboard::open(&self.service);
                self.screen = Screen::Dashboard(Dashboard::Support(dash));
                flow
            }
        };
        self.apply(flow);
    }

    fn apply(&mut self, flow: Flow) {
        match flow {
            Flow::Stay => {}
            Flow::Notice(msg) => self.status_message = Some(msg),
            Flow::Logout => {
                self.service.logout();
                self.screen = Screen::login(None);
                self.status_message = Some("Logged out".into());
            }
            Flow::Expired => self.expire(),
        }
    }

    fn expire(&mut self) {
        warn!("session rejected by server, back to login");
        self.service.session().clear();
        self.screen = Screen::login(Some(SESSION_EXPIRED.into()));
    }

    /// Switch to the crash screen. `detail` only goes to the log.
    pub fn crash(&mut self, detail: &str) {
        error!("ui panicked: {detail}");
        self.status_message = None;
        self.screen = Screen::Crashed {
            message: CRASH_MESSAGE.into(),
        };
    }

    pub fn is_input_mode(&self) -> bool {
        match &self.screen {
            Screen::Login { .. } | Screen::Signup { .. } => true,
            Screen::Dashboard(Dashboard::Client(dash)) => dash.is_input_mode(),
            Screen::Dashboard(Dashboard::Support(_)) | Screen::Crashed { .. } => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        if matches!(self.screen, Screen::Crashed { .. }) {
            if key.code == KeyCode::Char('r') {
                info!("reloading after crash");
                self.start();
            }
            return;
        }
        if matches!(self.screen, Screen::Login { .. } | Screen::Signup { .. }) {
            self.handle_auth_key(key);
            return;
        }

        let flow = match &mut self.screen {
            Screen::Dashboard(Dashboard::Client(dash)) => dash.handle_key(key, &self.service),
            Screen::Dashboard(Dashboard::Support(dash)) => dash.handle_key(key, &self.service),
            _ => return,
        };
        self.apply(flow);
    }

    fn handle_auth_key(&mut self, key: KeyEvent) {
        match std::mem::replace(&mut self.screen, Screen::login(None)) {
            Screen::Login { form, field, error } => self.handle_login(key, form, field, error),
            Screen::Signup { form, field, error } => self.handle_signup(key, form, field, error),
            other => self.screen = other,
        }
    }

    fn handle_login(
        &mut self,
        key: KeyEvent,
        mut form: LoginForm,
        mut field: LoginField,
        mut error: Option<String>,
    ) {
        match key.code {
            KeyCode::Tab => {
                self.screen = Screen::Signup {
                    form: SignupForm {
                        email: form.email,
                        ..Default::default()
                    },
                    field: SignupField::Name,
                    error: None,
                };
                return;
            }
            KeyCode::Up | KeyCode::Down | KeyCode::BackTab => {
                field = match field {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            KeyCode::Enter => {
                if let Err(e) = form.validate() {
                    error = Some(e.to_string());
                } else {
                    match self.service.login(&form) {
                        Ok(user) => {
                            self.enter_dashboard(&user);
                            return;
                        }
                        Err(e) => error = Some(e.user_message()),
                    }
                }
            }
            KeyCode::Backspace => {
                match field {
                    LoginField::Email => form.email.pop(),
                    LoginField::Password => form.password.pop(),
                };
            }
            KeyCode::Char(c) => match field {
                LoginField::Email => form.email.push(c),
                LoginField::Password => form.password.push(c),
            },
            _ => {}
        }
        self.screen = Screen::Login { form, field, error };
    }

    fn handle_signup(
        &mut self,
        key: KeyEvent,
        mut form: SignupForm,
        mut field: SignupField,
        mut error: Option<String>,
    ) {
        match key.code {
            KeyCode::Tab => {
                self.screen = Screen::Login {
                    form: LoginForm {
                        email: form.email,
                        ..Default::default()
                    },
                    field: LoginField::Email,
                    error: None,
                };
                return;
            }
            KeyCode::Down => field = field.next(),
            KeyCode::Up | KeyCode::BackTab => field = field.prev(),
            KeyCode::Enter => {
                if let Err(e) = form.validate() {
                    error = Some(e.to_string());
                } else {
                    match self.service.signup(&form) {
                        Ok(user) => {
                            self.enter_dashboard(&user);
                            return;
                        }
                        Err(e) => error = Some(e.user_message()),
                    }
                }
            }
            KeyCode::Backspace => {
                signup_input(&mut form, field).pop();
            }
            KeyCode::Char(c) => signup_input(&mut form, field).push(c),
            _ => {}
        }
        self.screen = Screen::Signup { form, field, error };
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);

        match &self.screen {
            Screen::Login { form, field, error } => {
                let fields = [
                    ("Email", form.email.clone(), *field == LoginField::Email),
                    (
                        "Password",
                        "*".repeat(form.password.chars().count()),
                        *field == LoginField::Password,
                    ),
                ];
                render_auth_form(frame, " Log In ", &fields, error.as_deref(), layout[1]);
            }
            Screen::Signup { form, field, error } => {
                let fields = [
                    ("Name", form.name.clone(), *field == SignupField::Name),
                    ("Email", form.email.clone(), *field == SignupField::Email),
                    (
                        "Password",
                        "*".repeat(form.password.chars().count()),
                        *field == SignupField::Password,
                    ),
                ];
                render_auth_form(frame, " Sign Up ", &fields, error.as_deref(), layout[1]);
            }
            Screen::Dashboard(Dashboard::Client(dash)) => dash.render(frame, layout[1]),
            Screen::Dashboard(Dashboard::Support(dash)) => dash.render(frame, layout[1]),
            Screen::Crashed { message } => {
                let popup = centered_rect(50, 30, layout[1]);
                frame.render_widget(Clear, popup);
                let block = Block::default()
                    .title(" Error ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red));
                frame.render_widget(
                    Paragraph::new(message.as_str())
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true })
                        .block(block),
                    popup,
                );
            }
        }

        self.render_status_bar(frame, layout[2]);
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            " helpdesk ",
            Style::default().bold().fg(Color::Cyan),
        )];
        if let (Screen::Dashboard(_), Some(user)) = (&self.screen, self.service.session().user()) {
            spans.push(Span::raw("| "));
            spans.push(Span::styled(user.name, Style::default().fg(Color::Yellow)));
            spans.push(Span::styled(
                format!(" ({})", user.role),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref msg) = self.status_message {
            let line = Line::from(Span::styled(
                format!(" {msg}"),
                Style::default().fg(Color::Green),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints = match &self.screen {
            Screen::Login { .. } => vec![
                ("Enter", "log in"),
                ("↑/↓", "field"),
                ("Tab", "sign up"),
                ("Ctrl+C", "quit"),
            ],
            Screen::Signup { .. } => vec![
                ("Enter", "sign up"),
                ("↑/↓", "field"),
                ("Tab", "log in"),
                ("Ctrl+C", "quit"),
            ],
            Screen::Dashboard(Dashboard::Client(dash)) => dash.hints(),
            Screen::Dashboard(Dashboard::Support(dash)) => dash.hints(),
            Screen::Crashed { .. } => vec![("r", "reload"), ("q", "quit")],
        };

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!(" {key}"),
                        Style::default().fg(Color::Yellow).bold(),
                    ),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }
}

fn signup_input(form: &mut SignupForm, field: SignupField) -> &mut String {
    match field {
        SignupField::Name => &mut form.name,
        SignupField::Email => &mut form.email,
        SignupField::Password => &mut form.password,
    }
}

/// `fields` are (label, display value, focused).
fn render_auth_form(
    frame: &mut Frame,
    title: &str,
    fields: &[(&str, String, bool)],
    error: Option<&str>,
    area: Rect,
) {
    let popup = centered_rect(50, 50, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = Vec::new();
    for (label, value, focused) in fields {
        let style = if *focused {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().bold()
        };
        lines.push(Line::from(Span::styled(format!("{label}:"), style)));
        let cursor = if *focused { "_" } else { "" };
        lines.push(Line::from(format!("  {value}{cursor}")));
        lines.push(Line::from(""));
    }
    if let Some(err) = error {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
