//! Integration tests for HttpService + BlockingHttpService against the
//! in-process test server.

use std::sync::Arc;

use helpdesk_core::form::{LoginForm, SignupForm, TicketInput};
use helpdesk_core::ticket::{
    RequestPriority, RequestStatus, RequestType, SortField, SortOrder, TicketFilter, TicketSort,
};
use helpdesk_core::user::Role;
use helpdesk_service::{BlockingHttpService, HelpdeskApi, HttpService, ServiceError, SessionStore};
use helpdesk_testserver::{spawn_test_server, AppState};

fn signup_form(name: &str, email: &str) -> SignupForm {
    SignupForm {
        name: name.into(),
        email: email.into(),
        password: "hunter2".into(),
    }
}

fn ticket(kind: RequestType, request: &str, priority: RequestPriority) -> TicketInput {
    TicketInput {
        kind,
        request: request.into(),
        priority,
    }
}

/// A fresh in-memory session pointed at `url`.
fn service(url: &str) -> HttpService {
    HttpService::new(url, Arc::new(SessionStore::in_memory()))
}

async fn client_service(url: &str) -> HttpService {
    let svc = service(url);
    svc.signup(&signup_form("Ana", "ana@example.com"))
        .await
        .unwrap();
    svc
}

async fn support_service(url: &str) -> HttpService {
    let svc = service(url);
    svc.signup(&signup_form("Bo", "bo@support.example.com"))
        .await
        .unwrap();
    svc
}

// ---- Auth ----

#[tokio::test]
async fn signup_logs_in_and_detects_role() {
    let server = spawn_test_server().await;

    let client = service(&server.base_url);
    let user = client
        .signup(&signup_form("Ana", "ana@example.com"))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Client);
    assert!(client.session().is_authenticated());
    assert_eq!(client.current_user().await.unwrap().email, "ana@example.com");

    let support = service(&server.base_url);
    let user = support
        .signup(&signup_form("Bo", "bo@support.example.com"))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Support);
}

#[tokio::test]
async fn login_after_logout() {
    let server = spawn_test_server().await;
    let svc = client_service(&server.base_url).await;

    svc.logout();
    assert!(!svc.session().is_authenticated());

    let user = svc
        .login(&LoginForm {
            email: "ana@example.com".into(),
            password: "hunter2".into(),
        })
        .await
        .unwrap();
    assert_eq!(user.name, "Ana");
    assert!(svc.session().token().unwrap().starts_with("hd_"));
}

#[tokio::test]
async fn bad_credentials_carry_server_detail() {
    let server = spawn_test_server().await;
    client_service(&server.base_url).await;

    let svc = service(&server.base_url);
    let err = svc
        .login(&LoginForm {
            email: "ana@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Invalid email or password");
    assert!(!svc.session().is_authenticated());
}

#[tokio::test]
async fn duplicate_signup_is_invalid_input() {
    let server = spawn_test_server().await;
    client_service(&server.base_url).await;

    let err = service(&server.base_url)
        .signup(&signup_form("Ana again", "ana@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(err.user_message(), "This email address is already in use");
}

// ---- Client tickets ----

#[tokio::test]
async fn created_ticket_appears_exactly_once() {
    let server = spawn_test_server().await;
    let svc = client_service(&server.base_url).await;

    let created = svc
        .create_ticket(&ticket(
            RequestType::Development,
            "Server crashes on upload",
            RequestPriority::Important,
        ))
        .await
        .unwrap();
    assert_eq!(created.kind.label(), "Development");
    assert_eq!(created.priority.label(), "Important");
    assert_eq!(created.status, RequestStatus::Pending);
    assert!(created.is_new());
    assert!(created.created_at.is_none());

    let mine = svc.list_my_tickets(&TicketFilter::default()).await.unwrap();
    assert_eq!(mine.iter().filter(|t| t.id == created.id).count(), 1);

    let fetched = svc.get_my_ticket(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn filters_and_sort_reach_the_server() {
    let server = spawn_test_server().await;
    let svc = client_service(&server.base_url).await;

    for (kind, priority) in [
        (RequestType::Review, RequestPriority::Middle),
        (RequestType::Development, RequestPriority::Important),
        (RequestType::Review, RequestPriority::CanWait),
    ] {
        svc.create_ticket(&ticket(kind, "something", priority))
            .await
            .unwrap();
    }

    let reviews = svc
        .list_my_tickets(&TicketFilter {
            kind: Some(RequestType::Review),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(reviews.len(), 2);
    assert!(reviews.iter().all(|t| t.kind == RequestType::Review));

    let by_priority = svc
        .list_my_tickets(&TicketFilter {
            sort: Some(TicketSort {
                field: SortField::Priority,
                order: SortOrder::Desc,
            }),
            ..Default::default()
        })
        .await
        .unwrap();
    let priorities: Vec<_> = by_priority.iter().map(|t| t.priority).collect();
    assert_eq!(
        priorities,
        vec![
            RequestPriority::Important,
            RequestPriority::Middle,
            RequestPriority::CanWait
        ]
    );

    let done = svc
        .list_my_tickets(&TicketFilter {
            status: Some(RequestStatus::Done),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(done.is_empty());
}

#[tokio::test]
async fn client_edits_own_ticket() {
    let server = spawn_test_server().await;
    let svc = client_service(&server.base_url).await;
    let created = svc
        .create_ticket(&ticket(RequestType::Review, "typo", RequestPriority::CanWait))
        .await
        .unwrap();

    let updated = svc
        .update_ticket(
            created.id,
            &ticket(RequestType::Development, "real bug", RequestPriority::Middle),
        )
        .await
        .unwrap();
    assert_eq!(updated.kind, RequestType::Development);
    assert_eq!(updated.request, "real bug");
    assert_eq!(updated.status, RequestStatus::Pending);
}

#[tokio::test]
async fn other_clients_ticket_is_not_found() {
    let server = spawn_test_server().await;
    let ana = client_service(&server.base_url).await;
    let created = ana
        .create_ticket(&ticket(RequestType::Review, "mine", RequestPriority::Middle))
        .await
        .unwrap();

    let cy = service(&server.base_url);
    cy.signup(&signup_form("Cy", "cy@example.com")).await.unwrap();
    let err = cy.get_my_ticket(created.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.user_message(), "Couldn't find request");
}

// ---- Support ----

#[tokio::test]
async fn support_open_marks_viewed_and_updates_status() {
    let server = spawn_test_server().await;
    let client = client_service(&server.base_url).await;
    let created = client
        .create_ticket(&ticket(
            RequestType::Development,
            "Server crashes on upload",
            RequestPriority::Important,
        ))
        .await
        .unwrap();

    let support = support_service(&server.base_url).await;
    let unviewed = TicketFilter {
        viewed: Some(false),
        ..Default::default()
    };
    assert_eq!(support.list_all_tickets(&unviewed).await.unwrap().len(), 1);

    let opened = support.get_ticket_for_support(created.id).await.unwrap();
    assert!(opened.viewed);
    assert!(opened.created_at.is_some());
    assert!(support.list_all_tickets(&unviewed).await.unwrap().is_empty());

    let moved = support
        .update_ticket_status(created.id, RequestStatus::InProcess)
        .await
        .unwrap();
    assert_eq!(moved.status, RequestStatus::InProcess);

    let seen_by_client = client.get_my_ticket(created.id).await.unwrap();
    assert_eq!(seen_by_client.status, RequestStatus::InProcess);
    assert!(!seen_by_client.is_new());
}

#[tokio::test]
async fn support_lists_only_clients() {
    let server = spawn_test_server().await;
    client_service(&server.base_url).await;
    let support = support_service(&server.base_url).await;

    let clients = support.list_clients().await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].email, "ana@example.com");
}

#[tokio::test]
async fn client_is_forbidden_from_support_routes() {
    let server = spawn_test_server().await;
    let client = client_service(&server.base_url).await;
    let err = client.list_clients().await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert!(client.session().is_authenticated());
}

// ---- 401 policy ----

#[tokio::test]
async fn expired_token_clears_session() {
    let server = spawn_test_server().await;
    let svc = client_service(&server.base_url).await;

    server.state.expire_sessions();
    let err = svc
        .list_my_tickets(&TicketFilter::default())
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!svc.session().is_authenticated());
}

#[tokio::test]
async fn session_file_survives_restart_and_is_removed_on_401() {
    let server = spawn_test_server().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let first = HttpService::new(&server.base_url, Arc::new(SessionStore::open(&path)));
    first
        .signup(&signup_form("Ana", "ana@example.com"))
        .await
        .unwrap();
    assert!(path.exists());

    let second = HttpService::new(&server.base_url, Arc::new(SessionStore::open(&path)));
    assert_eq!(second.current_user().await.unwrap().name, "Ana");

    server.state.expire_sessions();
    second.current_user().await.unwrap_err();
    assert!(!path.exists());
}

// ---- Blocking HttpService ----

// BlockingHttpService creates its own tokio runtime, so the server runs
// on a separate thread to avoid nested runtime panics.

fn spawn_blocking_server() -> (String, AppState) {
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let server = spawn_test_server().await;
            tx.send((server.base_url.clone(), server.state.clone())).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}

#[test]
fn blocking_round_trip() {
    let (url, state) = spawn_blocking_server();
    let svc = BlockingHttpService::new(&url, Arc::new(SessionStore::in_memory())).unwrap();

    svc.signup(&signup_form("Ana", "ana@example.com")).unwrap();
    let created = svc
        .create_ticket(&ticket(
            RequestType::Review,
            "Please review the invoice",
            RequestPriority::Middle,
        ))
        .unwrap();
    let mine = svc.list_my_tickets(&TicketFilter::default()).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.id);

    let before = state.request_count();
    svc.logout();
    assert_eq!(state.request_count(), before);
    assert!(!svc.session().is_authenticated());
}
