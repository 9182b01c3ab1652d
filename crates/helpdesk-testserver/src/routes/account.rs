use axum::{extract::State, http::StatusCode, routing::{get, post}, Extension, Json, Router};
use helpdesk_core::form::{LoginForm, SignupForm};
use helpdesk_core::session::TokenResponse;
use helpdesk_core::user::User;

use super::{detail, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupForm>,
) -> Result<Json<User>, ApiError> {
    state
        .store()
        .create_account(&input.name, &input.email, &input.password)
        .map(Json)
        .ok_or_else(|| {
            detail(
                StatusCode::BAD_REQUEST,
                "This email address is already in use",
            )
        })
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut store = state.store();
    let user = store
        .authenticate(&input.email, &input.password)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Invalid email or password"))?;
    let access_token = store.issue_token(user.id);
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        user: None,
    }))
}

async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
