//! State machine tests for the TUI App.
//!
//! Each test spawns a test server on a separate thread (to avoid nested tokio runtime panics),
//! creates a BlockingHttpService, builds an App, and simulates key events.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use helpdesk_core::ticket::{RequestPriority, RequestStatus, RequestType, Ticket};
use helpdesk_service::{BlockingHttpService, SessionStore};
use helpdesk_testserver::AppState;
use helpdesk_tui::app::{App, Dashboard, Screen, CRASH_MESSAGE, SESSION_EXPIRED};
use helpdesk_tui::dashboard::{
    ClientDashboard, ClientDialog, SupportDashboard, SupportTab, CLIENT_EMPTY,
};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

const CLIENT_EMAIL: &str = "ana@example.com";
const SUPPORT_EMAIL: &str = "bo@support.example.com";
const PASSWORD: &str = "hunter2";

/// Spawn the test server on a separate thread, return its URL and state.
fn spawn_server() -> (String, AppState) {
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let server = helpdesk_testserver::spawn_test_server().await;
            tx.send((server.base_url.clone(), server.state.clone())).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn char_key(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(char_key(c));
    }
}

fn make_app(url: &str, session: Arc<SessionStore>) -> App {
    App::new(BlockingHttpService::new(url, session).unwrap())
}

/// Seed both accounts directly in the store; returns the client's user id.
fn seed_accounts(state: &AppState) -> i64 {
    let mut store = state.store();
    let client = store.create_account("Ana", CLIENT_EMAIL, PASSWORD).unwrap();
    store.create_account("Bo", SUPPORT_EMAIL, PASSWORD).unwrap();
    client.id
}

fn seed_ticket(state: &AppState, owner: i64, request: &str) -> Ticket {
    state.store().insert_ticket(
        owner,
        Ticket {
            id: 0,
            kind: RequestType::Review,
            request: request.into(),
            priority: RequestPriority::Middle,
            status: RequestStatus::Pending,
            viewed: false,
            created_at: None,
        },
    )
}

fn login(app: &mut App, email: &str) {
    type_text(app, email);
    app.handle_key(key(KeyCode::Down));
    type_text(app, PASSWORD);
    app.handle_key(key(KeyCode::Enter));
}

fn client(app: &App) -> &ClientDashboard {
    match app.screen() {
        Screen::Dashboard(Dashboard::Client(dash)) => dash,
        _ => panic!("not on the client dashboard"),
    }
}

fn support(app: &App) -> &SupportDashboard {
    match app.screen() {
        Screen::Dashboard(Dashboard::Support(dash)) => dash,
        _ => panic!("not on the support dashboard"),
    }
}

fn login_error(app: &App) -> Option<&str> {
    match app.screen() {
        Screen::Login { error, .. } => error.as_deref(),
        _ => panic!("not on the login screen"),
    }
}

fn screen_text(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal.draw(|frame| app.render(frame)).unwrap();
    terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

// ---- Login / signup ----

#[test]
fn starts_at_login_without_session() {
    let (url, _state) = spawn_server();
    let app = make_app(&url, Arc::new(SessionStore::in_memory()));
    assert!(matches!(app.screen(), Screen::Login { .. }));
    assert!(app.is_input_mode());
    assert!(screen_text(&app).contains("Log In"));
}

#[test]
fn tab_toggles_between_login_and_signup() {
    let (url, _state) = spawn_server();
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    type_text(&mut app, "ana@");
    app.handle_key(key(KeyCode::Tab));
    match app.screen() {
        Screen::Signup { form, .. } => assert_eq!(form.email, "ana@"),
        _ => panic!("expected signup"),
    }
    app.handle_key(key(KeyCode::Tab));
    assert!(matches!(app.screen(), Screen::Login { .. }));
}

#[test]
fn empty_login_is_blocked_client_side() {
    let (url, state) = spawn_server();
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(login_error(&app), Some("email is required"));
    assert_eq!(state.request_count(), 0);
}

#[test]
fn wrong_password_shows_server_message() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    type_text(&mut app, CLIENT_EMAIL);
    app.handle_key(key(KeyCode::Down));
    type_text(&mut app, "nope");
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(login_error(&app), Some("Invalid email or password"));
}

#[test]
fn client_login_shows_empty_state() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let session = Arc::new(SessionStore::in_memory());
    let mut app = make_app(&url, session.clone());
    login(&mut app, CLIENT_EMAIL);

    let dash = client(&app);
    assert!(dash.list().tickets().is_empty());
    assert!(dash.list().error().is_none());
    assert!(session.is_authenticated());
    assert!(!app.is_input_mode());
    assert!(screen_text(&app).contains(CLIENT_EMPTY));
}

#[test]
fn signup_with_support_email_opens_support_dashboard() {
    let (url, _state) = spawn_server();
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    app.handle_key(key(KeyCode::Tab));
    type_text(&mut app, "Bo");
    app.handle_key(key(KeyCode::Down));
    type_text(&mut app, SUPPORT_EMAIL);
    app.handle_key(key(KeyCode::Down));
    type_text(&mut app, PASSWORD);
    app.handle_key(key(KeyCode::Enter));

    let dash = support(&app);
    assert_eq!(dash.tab(), SupportTab::Requests);
    assert!(screen_text(&app).contains("No requests found."));
}

// ---- Client dashboard ----

#[test]
fn create_without_description_issues_no_call() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);

    app.handle_key(char_key('n'));
    assert!(app.is_input_mode());
    let before = state.request_count();
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(state.request_count(), before);

    match client(&app).dialog() {
        Some(ClientDialog::Create(editor)) => {
            assert_eq!(editor.error(), Some("description is required"))
        }
        _ => panic!("create dialog should stay open"),
    }

    app.handle_key(key(KeyCode::Esc));
    assert!(client(&app).dialog().is_none());
}

#[test]
fn created_request_shows_up_once_with_labels() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);

    app.handle_key(char_key('n'));
    app.handle_key(key(KeyCode::Right)); // Review -> Development
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Right)); // Middle -> Important
    app.handle_key(key(KeyCode::Tab));
    type_text(&mut app, "Server crashes on upload");
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.status_message(), Some("Request created"));
    let dash = client(&app);
    assert!(dash.dialog().is_none());
    let matching: Vec<_> = dash
        .list()
        .tickets()
        .iter()
        .filter(|t| t.request == "Server crashes on upload")
        .collect();
    assert_eq!(matching.len(), 1);
    let ticket = matching[0];
    assert_eq!(ticket.kind.label(), "Development");
    assert_eq!(ticket.priority.label(), "Important");
    assert_eq!(ticket.status.label(), "Pending");
    assert!(ticket.is_new());

    let text = screen_text(&app);
    assert!(text.contains("Server crashes on upload"));
    assert!(text.contains("Pending  New"));
}

#[test]
fn filter_without_matches_shows_empty_state_not_error() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);
    assert_eq!(client(&app).list().tickets().len(), 1);

    app.handle_key(char_key('s')); // Pending
    assert_eq!(client(&app).list().tickets().len(), 1);
    app.handle_key(char_key('s')); // In Process
    let dash = client(&app);
    assert!(dash.list().tickets().is_empty());
    assert!(dash.list().error().is_none());
    assert!(screen_text(&app).contains(CLIENT_EMPTY));

    app.handle_key(char_key('c'));
    assert_eq!(client(&app).list().tickets().len(), 1);
}

#[test]
fn client_edits_request_from_detail() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    let seeded = seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);

    app.handle_key(key(KeyCode::Enter));
    match client(&app).dialog() {
        Some(ClientDialog::Detail(detail)) => {
            assert_eq!(detail.ticket().id, seeded.id);
            assert!(detail.editor().is_none());
        }
        _ => panic!("expected detail dialog"),
    }
    assert!(!app.is_input_mode());

    app.handle_key(char_key('e'));
    assert!(app.is_input_mode());
    app.handle_key(key(KeyCode::BackTab)); // Type -> Description
    type_text(&mut app, "!");
    app.handle_key(key(KeyCode::Enter));

    match client(&app).dialog() {
        Some(ClientDialog::Detail(detail)) => {
            assert_eq!(detail.ticket().request, "Printer on fire!");
            assert!(detail.editor().is_none());
        }
        _ => panic!("detail should stay open after saving"),
    }
    assert_eq!(client(&app).list().tickets()[0].request, "Printer on fire!");

    app.handle_key(key(KeyCode::Esc));
    assert!(client(&app).dialog().is_none());
}

#[test]
fn clearing_description_on_edit_issues_no_call() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);

    app.handle_key(key(KeyCode::Enter));
    app.handle_key(char_key('e'));
    app.handle_key(key(KeyCode::BackTab)); // Type -> Description
    for _ in "Printer on fire".chars() {
        app.handle_key(key(KeyCode::Backspace));
    }
    let before = state.request_count();
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(state.request_count(), before);

    match client(&app).dialog() {
        Some(ClientDialog::Detail(detail)) => {
            let editor = detail.editor().expect("editor should stay open");
            assert_eq!(editor.error(), Some("description is required"));
            assert_eq!(detail.ticket().request, "Printer on fire");
        }
        _ => panic!("expected detail dialog"),
    }
}

#[test]
fn saved_edit_reloads_list_even_if_reread_fails() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);

    app.handle_key(key(KeyCode::Enter));
    app.handle_key(char_key('e'));
    app.handle_key(key(KeyCode::BackTab));
    type_text(&mut app, "!");

    state.fail_single_reads(true);
    let before = state.request_count();
    app.handle_key(key(KeyCode::Enter));
    // PUT, the failed GET, then the list reload.
    assert_eq!(state.request_count(), before + 3);

    let dash = client(&app);
    assert_eq!(dash.list().tickets()[0].request, "Printer on fire!");
    match dash.dialog() {
        Some(ClientDialog::Detail(detail)) => {
            assert!(detail.editor().is_none());
            assert_eq!(detail.error(), Some("Storage unavailable"));
            assert_eq!(detail.ticket().request, "Printer on fire!");
        }
        _ => panic!("detail should stay open after saving"),
    }
    assert!(screen_text(&app).contains("Storage unavailable"));
}

// ---- Support dashboard ----

#[test]
fn opening_a_ticket_marks_it_viewed() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, SUPPORT_EMAIL);

    assert_eq!(support(&app).stats().unviewed, 1);
    assert_eq!(support(&app).stats().pending, 1);

    app.handle_key(key(KeyCode::Enter));
    let dash = support(&app);
    assert!(dash.detail().unwrap().ticket().viewed);
    assert!(dash.list().tickets()[0].viewed);
    assert_eq!(dash.stats().unviewed, 0);
}

#[test]
fn same_status_press_issues_no_call() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, SUPPORT_EMAIL);
    app.handle_key(key(KeyCode::Enter));

    let before = state.request_count();
    app.handle_key(char_key('1')); // already Pending
    assert_eq!(state.request_count(), before);

    app.handle_key(char_key('2'));
    assert!(state.request_count() > before);
    let dash = support(&app);
    assert_eq!(dash.detail().unwrap().ticket().status, RequestStatus::InProcess);
    assert_eq!(dash.list().tickets()[0].status, RequestStatus::InProcess);
    assert_eq!(dash.stats().in_process, 1);
}

#[test]
fn status_change_reloads_list_even_if_reread_fails() {
    let (url, state) = spawn_server();
    let owner = seed_accounts(&state);
    seed_ticket(&state, owner, "Printer on fire");
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, SUPPORT_EMAIL);
    app.handle_key(key(KeyCode::Enter));

    state.fail_single_reads(true);
    app.handle_key(char_key('3'));
    let dash = support(&app);
    let detail = dash.detail().unwrap();
    assert_eq!(detail.error(), Some("Storage unavailable"));
    assert_eq!(detail.ticket().status, RequestStatus::Done);
    assert_eq!(dash.list().tickets()[0].status, RequestStatus::Done);
    assert_eq!(dash.stats().done, 1);

    // The guard now sees Done, so pressing it again sends nothing.
    let before = state.request_count();
    app.handle_key(char_key('3'));
    assert_eq!(state.request_count(), before);
}

#[test]
fn clients_tab_lists_clients() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, SUPPORT_EMAIL);

    app.handle_key(key(KeyCode::Tab));
    let dash = support(&app);
    assert_eq!(dash.tab(), SupportTab::Clients);
    assert_eq!(dash.clients().len(), 1);
    assert_eq!(dash.clients()[0].email, CLIENT_EMAIL);
    assert!(screen_text(&app).contains(CLIENT_EMAIL));

    app.handle_key(key(KeyCode::Tab));
    assert_eq!(support(&app).tab(), SupportTab::Requests);
}

// ---- Session handling ----

#[test]
fn expired_session_returns_to_login() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let session = Arc::new(SessionStore::in_memory());
    let mut app = make_app(&url, session.clone());
    login(&mut app, CLIENT_EMAIL);

    state.expire_sessions();
    app.handle_key(char_key('r'));

    assert_eq!(login_error(&app), Some(SESSION_EXPIRED));
    assert!(!session.is_authenticated());
}

#[test]
fn logout_clears_session() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let session = Arc::new(SessionStore::in_memory());
    let mut app = make_app(&url, session.clone());
    login(&mut app, SUPPORT_EMAIL);

    let before = state.request_count();
    app.handle_key(char_key('L'));
    assert!(matches!(app.screen(), Screen::Login { error: None, .. }));
    assert_eq!(app.status_message(), Some("Logged out"));
    assert!(!session.is_authenticated());
    assert_eq!(state.request_count(), before);
}

#[test]
fn persisted_session_skips_login() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut first = make_app(&url, Arc::new(SessionStore::open(&path)));
    login(&mut first, CLIENT_EMAIL);
    drop(first);

    let second = make_app(&url, Arc::new(SessionStore::open(&path)));
    client(&second);

    state.expire_sessions();
    let third = make_app(&url, Arc::new(SessionStore::open(&path)));
    assert_eq!(login_error(&third), Some(SESSION_EXPIRED));
    assert!(!path.exists());
}

#[test]
fn crash_screen_reloads_from_session() {
    let (url, state) = spawn_server();
    seed_accounts(&state);
    let mut app = make_app(&url, Arc::new(SessionStore::in_memory()));
    login(&mut app, CLIENT_EMAIL);

    app.crash("index out of bounds");
    match app.screen() {
        Screen::Crashed { message } => assert_eq!(message, CRASH_MESSAGE),
        _ => panic!("expected crash screen"),
    }
    assert!(!app.is_input_mode());
    assert!(!screen_text(&app).contains("index out of bounds"));

    app.handle_key(char_key('x'));
    assert!(matches!(app.screen(), Screen::Crashed { .. }));
    app.handle_key(char_key('r'));
    client(&app);
}
