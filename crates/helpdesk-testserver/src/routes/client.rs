use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use helpdesk_core::form::TicketInput;
use helpdesk_core::ticket::{RequestPriority, RequestStatus, RequestType, Ticket};
use helpdesk_core::user::{Role, User};
use serde::Deserialize;

use super::{
    check_single_read, client_view, invalid_enum, not_found, require_role, ApiError, ListQuery,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/client/request/", post(create_request))
        .route("/client/my-requests/", get(my_requests))
        .route("/client/request/{id}", get(get_request).put(update_request))
}

async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(input): Json<TicketInput>,
) -> Result<Json<Ticket>, ApiError> {
    require_role(&user, Role::Client)?;
    if !input.kind.is_known() {
        return Err(invalid_enum("type"));
    }
    if !input.priority.is_known() {
        return Err(invalid_enum("priority"));
    }
    let ticket = state.store().insert_ticket(
        user.id,
        Ticket {
            id: 0,
            kind: input.kind,
            request: input.request,
            priority: input.priority,
            status: RequestStatus::Pending,
            viewed: false,
            created_at: None,
        },
    );
    Ok(Json(client_view(ticket)))
}

async fn my_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    require_role(&user, Role::Client)?;
    let tickets = state.store().tickets_for(Some(user.id));
    let tickets = query.apply(tickets)?;
    Ok(Json(tickets.into_iter().map(client_view).collect()))
}

async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>, ApiError> {
    require_role(&user, Role::Client)?;
    check_single_read(&state)?;
    let mut store = state.store();
    let ticket = store.ticket_mut(id, Some(user.id)).ok_or_else(not_found)?;
    Ok(Json(client_view(ticket.clone())))
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Deserialize)]
struct UpdateBody {
    #[serde(rename = "type")]
    kind: Option<RequestType>,
    request: Option<String>,
    priority: Option<RequestPriority>,
}

async fn update_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateBody>,
) -> Result<Json<Ticket>, ApiError> {
    require_role(&user, Role::Client)?;
    if input.kind.is_some_and(|k| !k.is_known()) {
        return Err(invalid_enum("type"));
    }
    if input.priority.is_some_and(|p| !p.is_known()) {
        return Err(invalid_enum("priority"));
    }
    let mut store = state.store();
    let ticket = store.ticket_mut(id, Some(user.id)).ok_or_else(not_found)?;
    if let Some(kind) = input.kind {
        ticket.kind = kind;
    }
    if let Some(request) = input.request {
        ticket.request = request;
    }
    if let Some(priority) = input.priority {
        ticket.priority = priority;
    }
    Ok(Json(client_view(ticket.clone())))
}
