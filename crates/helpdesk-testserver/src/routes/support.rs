use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use helpdesk_core::form::StatusUpdate;
use helpdesk_core::ticket::Ticket;
use helpdesk_core::user::{Role, User};

use super::{check_single_read, invalid_enum, not_found, require_role, ApiError, ListQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/support/clients/", get(list_clients))
        .route("/support/requests/", get(all_requests))
        .route("/support/request/{id}", get(get_request))
        .route("/support/request/{id}/status", put(update_status))
}

async fn list_clients(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_role(&user, Role::Support)?;
    Ok(Json(state.store().clients()))
}

async fn all_requests(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    require_role(&user, Role::Support)?;
    let tickets = state.store().tickets_for(None);
    query.apply(tickets).map(Json)
}

/// Opening a ticket as support marks it viewed.
async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>, ApiError> {
    require_role(&user, Role::Support)?;
    check_single_read(&state)?;
    let mut store = state.store();
    let ticket = store.ticket_mut(id, None).ok_or_else(not_found)?;
    ticket.viewed = true;
    Ok(Json(ticket.clone()))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(input): Json<StatusUpdate>,
) -> Result<Json<Ticket>, ApiError> {
    require_role(&user, Role::Support)?;
    if !input.status.is_known() {
        return Err(invalid_enum("status"));
    }
    let mut store = state.store();
    let ticket = store.ticket_mut(id, None).ok_or_else(not_found)?;
    ticket.status = input.status;
    Ok(Json(ticket.clone()))
}
