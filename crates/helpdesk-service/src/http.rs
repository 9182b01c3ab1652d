use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use helpdesk_core::form::{LoginForm, SignupForm, StatusUpdate, TicketInput};
use helpdesk_core::session::{Session, TokenResponse};
use helpdesk_core::ticket::{RequestStatus, Ticket, TicketFilter};
use helpdesk_core::user::{ClientSummary, User};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info, warn};

use crate::{HelpdeskApi, ServiceError, SessionStore};

/// Async HTTP client for the helpdesk backend.
///
/// Attaches the session's bearer token to every request and applies the
/// 401 policy: the stored session is cleared before the error is returned.
pub struct HttpService {
    base_url: String,
    client: Client,
    session: Arc<SessionStore>,
}

impl HttpService {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            session,
        }
    }

    pub fn with_connect_timeout(
        base_url: &str,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        path: &str,
    ) -> Result<T, ServiceError> {
        debug!(path, "sending request");
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        self.handle_response(resp, path).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ServiceError> {
        let builder = self.client.get(format!("{}{path}", self.base_url));
        self.send(builder, path).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        self.send(builder, path).await
    }

    async fn put_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .put(format!("{}{path}", self.base_url))
            .json(body);
        self.send(builder, path).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        path: &str,
    ) -> Result<T, ServiceError> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<T>()
                .await
                .map_err(|e| ServiceError::Decode(e.to_string()));
        }
        let err = parse_error_with_status(status, resp).await;
        if let ServiceError::Unauthorized(ref msg) = err {
            warn!(path, "401 from server, dropping session: {msg}");
            self.session.clear();
        } else {
            warn!(path, %status, "request failed: {err}");
        }
        Err(err)
    }

    /// `GET /auth/me` with an explicit token, used right after login before
    /// the session is stored.
    async fn fetch_me(&self, token: &str) -> Result<User, ServiceError> {
        let path = "/auth/me";
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        self.handle_response(resp, path).await
    }
}

fn list_path(base: &str, filter: &TicketFilter) -> String {
    let params: Vec<String> = filter
        .query_pairs()
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    if params.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", params.join("&"))
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = error_detail(&body).unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(msg),
        StatusCode::FORBIDDEN => ServiceError::Forbidden(msg),
        StatusCode::NOT_FOUND => ServiceError::NotFound(msg),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::InvalidInput(msg)
        }
        _ => ServiceError::Server(msg),
    }
}

/// Pull a human-readable message out of an error body. Handles
/// `{"detail": "..."}`, validation lists `{"detail": [{"msg": ".."}]}` and
/// `{"error": "..."}`.
fn error_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    match &value["detail"] {
        serde_json::Value::String(s) => return Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items.iter().filter_map(|i| i["msg"].as_str()).collect();
            if !msgs.is_empty() {
                return Some(msgs.join("; "));
            }
        }
        _ => {}
    }
    value["error"].as_str().map(String::from)
}

#[async_trait]
impl HelpdeskApi for HttpService {
    async fn login(&self, form: &LoginForm) -> Result<User, ServiceError> {
        let token: TokenResponse = self.post_json("/auth/login", form).await?;
        let user = match token.user {
            Some(user) => user,
            None => self.fetch_me(&token.access_token).await?,
        };
        let session = Session {
            token: token.access_token,
            user: user.clone(),
        };
        if let Err(e) = self.session.save(session) {
            warn!("session not persisted: {e}");
        }
        info!(user = %user.email, role = %user.role, "logged in");
        Ok(user)
    }

    async fn signup(&self, form: &SignupForm) -> Result<User, ServiceError> {
        let created: User = self.post_json("/auth/signup", form).await?;
        info!(user = %created.email, "account created");
        self.login(&form.credentials()).await
    }

    async fn current_user(&self) -> Result<User, ServiceError> {
        self.get_json("/auth/me").await
    }

    fn logout(&self) {
        self.session.clear();
        info!("logged out");
    }

    async fn create_ticket(&self, input: &TicketInput) -> Result<Ticket, ServiceError> {
        self.post_json("/client/request/", input).await
    }

    async fn list_my_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ServiceError> {
        self.get_json(&list_path("/client/my-requests/", filter)).await
    }

    async fn get_my_ticket(&self, id: i64) -> Result<Ticket, ServiceError> {
        self.get_json(&format!("/client/request/{id}")).await
    }

    async fn update_ticket(&self, id: i64, input: &TicketInput) -> Result<Ticket, ServiceError> {
        self.put_json(&format!("/client/request/{id}"), input).await
    }

    async fn list_all_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ServiceError> {
        self.get_json(&list_path("/support/requests/", filter)).await
    }

    async fn list_clients(&self) -> Result<Vec<ClientSummary>, ServiceError> {
        self.get_json("/support/clients/").await
    }

    async fn get_ticket_for_support(&self, id: i64) -> Result<Ticket, ServiceError> {
        self.get_json(&format!("/support/request/{id}")).await
    }

    async fn update_ticket_status(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<Ticket, ServiceError> {
        let path = format!("/support/request/{id}/status");
        self.put_json(&path, &StatusUpdate { status }).await
    }
}
