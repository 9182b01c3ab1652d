mod account;
mod client;
mod support;

use axum::{http::StatusCode, middleware, Json, Router};
use helpdesk_core::ticket::{
    RequestPriority, RequestStatus, RequestType, SortField, SortOrder, Ticket,
};
use helpdesk_core::user::{Role, User};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{auth_middleware, count_requests};
use crate::state::AppState;

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub fn build_router(state: AppState) -> Router {
    let public = Router::new().merge(account::routes());

    let protected = Router::new()
        .merge(account::protected_routes())
        .merge(client::routes())
        .merge(support::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}

pub(crate) fn detail(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(json!({ "detail": msg.into() })))
}

pub(crate) fn invalid_enum(field: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{ "loc": ["body", field], "msg": "value is not a valid enumeration member" }]
        })),
    )
}

pub(crate) fn not_found() -> ApiError {
    detail(StatusCode::NOT_FOUND, "Couldn't find request")
}

pub(crate) fn check_single_read(state: &AppState) -> Result<(), ApiError> {
    if state.single_reads_failing() {
        return Err(detail(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable"));
    }
    Ok(())
}

pub(crate) fn require_role(user: &User, role: Role) -> Result<(), ApiError> {
    if user.role == role {
        return Ok(());
    }
    let msg = match role {
        Role::Client => "Client Authorization required",
        Role::Support => "Support Authorization required",
    };
    Err(detail(StatusCode::FORBIDDEN, msg))
}

/// Shared query of the two list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(rename = "type")]
    kind: Option<i64>,
    status: Option<i64>,
    priority: Option<i64>,
    viewed: Option<bool>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

impl ListQuery {
    /// Filter and order `tickets` the way the backend does: newest first
    /// unless asked otherwise. Codes outside the enums are a 400.
    pub(crate) fn apply(&self, mut tickets: Vec<Ticket>) -> Result<Vec<Ticket>, ApiError> {
        let kind = parse_code(self.kind, RequestType::from_code)?;
        let status = parse_code(self.status, RequestStatus::from_code)?;
        let priority = parse_code(self.priority, RequestPriority::from_code)?;

        tickets.retain(|t| {
            kind.map_or(true, |k| t.kind == k)
                && status.map_or(true, |s| t.status == s)
                && priority.map_or(true, |p| t.priority == p)
                && self.viewed.map_or(true, |v| t.viewed == v)
        });

        let field = match self.sort_by.as_deref() {
            Some("priority") => SortField::Priority,
            _ => SortField::CreatedAt,
        };
        let order = match self.sort_order.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };
        tickets.sort_by(|a, b| {
            let ord = match field {
                SortField::Priority => a.priority.code().cmp(&b.priority.code()),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            }
            .then(a.id.cmp(&b.id));
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Ok(tickets)
    }
}

fn parse_code<T>(
    code: Option<i64>,
    from_code: fn(i64) -> Option<T>,
) -> Result<Option<T>, ApiError> {
    match code {
        None => Ok(None),
        Some(c) => from_code(c)
            .map(Some)
            .ok_or_else(|| detail(StatusCode::BAD_REQUEST, format!("Invalid value: {c}"))),
    }
}

/// The client endpoints do not expose `created_at`.
pub(crate) fn client_view(mut ticket: Ticket) -> Ticket {
    ticket.created_at = None;
    ticket
}
