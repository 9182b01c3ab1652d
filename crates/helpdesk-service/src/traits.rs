use async_trait::async_trait;
use helpdesk_core::form::{LoginForm, SignupForm, TicketInput};
use helpdesk_core::ticket::{RequestStatus, Ticket, TicketFilter};
use helpdesk_core::user::{ClientSummary, User};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Any 401. The session has already been cleared when this is returned.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("connection failed: {0}")]
    Network(String),

    #[error("json decode: {0}")]
    Decode(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized(_))
    }

    /// Text for an inline banner: the server's detail when it sent one,
    /// otherwise a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Unauthorized(msg)
            | ServiceError::Forbidden(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::InvalidInput(msg)
            | ServiceError::Server(msg)
                if !msg.trim().is_empty() =>
            {
                msg.clone()
            }
            ServiceError::Network(_) => "Could not reach the helpdesk server".into(),
            _ => "Something went wrong, please try again".into(),
        }
    }
}

/// The helpdesk backend as seen by the UI.
///
/// Every method is a thin wrapper over one REST call. Bearer auth and the
/// 401 policy live in the implementation, not in callers.
#[async_trait]
pub trait HelpdeskApi: Send + Sync {
    // -- Auth --
    async fn login(&self, form: &LoginForm) -> Result<User, ServiceError>;
    async fn signup(&self, form: &SignupForm) -> Result<User, ServiceError>;
    async fn current_user(&self) -> Result<User, ServiceError>;
    fn logout(&self);

    // -- Client --
    async fn create_ticket(&self, input: &TicketInput) -> Result<Ticket, ServiceError>;
    async fn list_my_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ServiceError>;
    async fn get_my_ticket(&self, id: i64) -> Result<Ticket, ServiceError>;
    async fn update_ticket(&self, id: i64, input: &TicketInput) -> Result<Ticket, ServiceError>;

    // -- Support --
    async fn list_all_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ServiceError>;
    async fn list_clients(&self) -> Result<Vec<ClientSummary>, ServiceError>;
    /// The server marks the ticket viewed as a side effect.
    async fn get_ticket_for_support(&self, id: i64) -> Result<Ticket, ServiceError>;
    async fn update_ticket_status(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<Ticket, ServiceError>;
}
