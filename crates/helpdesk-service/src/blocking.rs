use std::sync::Arc;
use std::time::Duration;

use helpdesk_core::form::{LoginForm, SignupForm, TicketInput};
use helpdesk_core::ticket::{RequestStatus, Ticket, TicketFilter};
use helpdesk_core::user::{ClientSummary, User};
use tokio::runtime::Runtime;

use crate::{HelpdeskApi, HttpService, ServiceError, SessionStore};

/// Blocking wrapper around the async `HttpService`.
///
/// Owns a tokio runtime and uses `block_on()` for each call.
/// Designed for sync callers like the TUI.
pub struct BlockingHttpService {
    inner: HttpService,
    rt: Runtime,
}

impl BlockingHttpService {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ServiceError> {
        Ok(Self {
            inner: HttpService::new(base_url, session),
            rt: new_runtime()?,
        })
    }

    pub fn with_connect_timeout(
        base_url: &str,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            inner: HttpService::with_connect_timeout(base_url, session, timeout)?,
            rt: new_runtime()?,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.inner.session()
    }

    // -- Auth --

    pub fn login(&self, form: &LoginForm) -> Result<User, ServiceError> {
        self.rt.block_on(self.inner.login(form))
    }

    pub fn signup(&self, form: &SignupForm) -> Result<User, ServiceError> {
        self.rt.block_on(self.inner.signup(form))
    }

    pub fn current_user(&self) -> Result<User, ServiceError> {
        self.rt.block_on(self.inner.current_user())
    }

    pub fn logout(&self) {
        self.inner.logout()
    }

    // -- Client --

    pub fn create_ticket(&self, input: &TicketInput) -> Result<Ticket, ServiceError> {
        self.rt.block_on(self.inner.create_ticket(input))
    }

    pub fn list_my_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ServiceError> {
        self.rt.block_on(self.inner.list_my_tickets(filter))
    }

    pub fn get_my_ticket(&self, id: i64) -> Result<Ticket, ServiceError> {
        self.rt.block_on(self.inner.get_my_ticket(id))
    }

    pub fn update_ticket(&self, id: i64, input: &TicketInput) -> Result<Ticket, ServiceError> {
        self.rt.block_on(self.inner.update_ticket(id, input))
    }

    // -- Support --

    pub fn list_all_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, ServiceError> {
        self.rt.block_on(self.inner.list_all_tickets(filter))
    }

    pub fn list_clients(&self) -> Result<Vec<ClientSummary>, ServiceError> {
        self.rt.block_on(self.inner.list_clients())
    }

    pub fn get_ticket_for_support(&self, id: i64) -> Result<Ticket, ServiceError> {
        self.rt.block_on(self.inner.get_ticket_for_support(id))
    }

    pub fn update_ticket_status(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<Ticket, ServiceError> {
        self.rt.block_on(self.inner.update_ticket_status(id, status))
    }
}

fn new_runtime() -> Result<Runtime, ServiceError> {
    Runtime::new().map_err(|e| ServiceError::Internal(format!("tokio runtime: {e}")))
}
