use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use helpdesk_core::ticket::{RequestStatus, Ticket};
use helpdesk_core::user::{Role, User};

use crate::auth::{generate_token, sha256_hex};

pub struct Account {
    pub user: User,
    pub password_hash: String,
}

pub struct StoredTicket {
    pub owner_id: i64,
    pub ticket: Ticket,
}

#[derive(Default)]
pub struct Store {
    accounts: Vec<Account>,
    tickets: Vec<StoredTicket>,
    tokens: HashMap<String, i64>,
    next_user_id: i64,
    next_ticket_id: i64,
}

impl Store {
    /// Emails containing "@support" become support users, like the real
    /// backend. Returns `None` if the email is taken.
    pub fn create_account(&mut self, name: &str, email: &str, password: &str) -> Option<User> {
        if self.find_by_email(email).is_some() {
            return None;
        }
        self.next_user_id += 1;
        let role = if email.to_lowercase().contains("@support") {
            Role::Support
        } else {
            Role::Client
        };
        let user = User {
            id: self.next_user_id,
            name: name.to_string(),
            email: email.to_string(),
            role,
        };
        self.accounts.push(Account {
            user: user.clone(),
            password_hash: sha256_hex(password),
        });
        Some(user)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user.email == email)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Option<User> {
        self.find_by_email(email)
            .filter(|a| a.password_hash == sha256_hex(password))
            .map(|a| a.user.clone())
    }

    pub fn issue_token(&mut self, user_id: i64) -> String {
        let token = generate_token();
        self.tokens.insert(token.clone(), user_id);
        token
    }

    pub fn user_for_token(&self, token: &str) -> Option<User> {
        let user_id = self.tokens.get(token)?;
        self.accounts
            .iter()
            .find(|a| a.user.id == *user_id)
            .map(|a| a.user.clone())
    }

    pub fn clients(&self) -> Vec<User> {
        self.accounts
            .iter()
            .filter(|a| a.user.role == Role::Client)
            .map(|a| a.user.clone())
            .collect()
    }

    pub fn insert_ticket(&mut self, owner_id: i64, mut ticket: Ticket) -> Ticket {
        self.next_ticket_id += 1;
        ticket.id = self.next_ticket_id;
        ticket.status = RequestStatus::Pending;
        ticket.viewed = false;
        ticket.created_at = Some(Utc::now());
        self.tickets.push(StoredTicket {
            owner_id,
            ticket: ticket.clone(),
        });
        ticket
    }

    /// Tickets visible to `owner` (all tickets when `None`).
    pub fn tickets_for(&self, owner: Option<i64>) -> Vec<Ticket> {
        self.tickets
            .iter()
            .filter(|t| owner.map_or(true, |o| t.owner_id == o))
            .map(|t| t.ticket.clone())
            .collect()
    }

    pub fn ticket_mut(&mut self, id: i64, owner: Option<i64>) -> Option<&mut Ticket> {
        self.tickets
            .iter_mut()
            .find(|t| t.ticket.id == id && owner.map_or(true, |o| t.owner_id == o))
            .map(|t| &mut t.ticket)
    }
}

pub struct InnerAppState {
    store: Mutex<Store>,
    requests: AtomicUsize,
    single_reads_failing: AtomicBool,
}

pub type AppState = Arc<InnerAppState>;

impl InnerAppState {
    pub fn shared() -> AppState {
        Arc::new(Self {
            store: Mutex::new(Store::default()),
            requests: AtomicUsize::new(0),
            single_reads_failing: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of HTTP requests the server has received.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Invalidate every issued token, as if they had all expired.
    pub fn expire_sessions(&self) {
        self.store().tokens.clear();
    }

    /// Make `GET` of a single ticket answer 500 while list and write
    /// endpoints keep working.
    pub fn fail_single_reads(&self, failing: bool) {
        self.single_reads_failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn single_reads_failing(&self) -> bool {
        self.single_reads_failing.load(Ordering::SeqCst)
    }
}
