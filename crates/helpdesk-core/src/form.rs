use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;
use crate::ticket::{RequestPriority, RequestStatus, RequestType, Ticket};

/// Body of `POST /client/request/` and `PUT /client/request/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInput {
    #[serde(rename = "type")]
    pub kind: RequestType,
    pub request: String,
    pub priority: RequestPriority,
}

/// Body of `PUT /support/request/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

/// Editable state behind the create and edit dialogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub kind: Option<RequestType>,
    pub priority: Option<RequestPriority>,
    pub request: String,
}

impl Default for TicketDraft {
    fn default() -> Self {
        Self {
            kind: Some(RequestType::Review),
            priority: Some(RequestPriority::Middle),
            request: String::new(),
        }
    }
}

impl TicketDraft {
    /// Pre-fill from an existing ticket. Unknown codes are left unset so the
    /// user has to pick a real value before saving.
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            kind: Some(ticket.kind).filter(RequestType::is_known),
            priority: Some(ticket.priority).filter(RequestPriority::is_known),
            request: ticket.request.clone(),
        }
    }

    pub fn next_kind(&mut self) {
        self.kind = Some(step(RequestType::ALL, self.kind, 1));
    }

    pub fn prev_kind(&mut self) {
        self.kind = Some(step(RequestType::ALL, self.kind, RequestType::ALL.len() - 1));
    }

    pub fn next_priority(&mut self) {
        self.priority = Some(step(RequestPriority::ALL, self.priority, 1));
    }

    pub fn prev_priority(&mut self) {
        self.priority = Some(step(
            RequestPriority::ALL,
            self.priority,
            RequestPriority::ALL.len() - 1,
        ));
    }

    pub fn validate(&self) -> Result<TicketInput, ValidationError> {
        let kind = self.kind.ok_or(ValidationError::Required("type"))?;
        let priority = self.priority.ok_or(ValidationError::Required("priority"))?;
        let request = self.request.trim();
        if request.is_empty() {
            return Err(ValidationError::Required("description"));
        }
        Ok(TicketInput {
            kind,
            request: request.to_string(),
            priority,
        })
    }
}

/// Wrapping step through `all`; an unset value lands on the first entry.
fn step<T: Copy + PartialEq>(all: &[T], current: Option<T>, by: usize) -> T {
    let idx = current
        .and_then(|c| all.iter().position(|v| *v == c))
        .map(|i| (i + by) % all.len())
        .unwrap_or(0);
    all[idx]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(serialize_with = "serialize_trimmed")]
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(serialize_with = "serialize_trimmed")]
    pub name: String,
    #[serde(serialize_with = "serialize_trimmed")]
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        Ok(())
    }

    /// Credentials for the login that follows a successful signup.
    pub fn credentials(&self) -> LoginForm {
        LoginForm {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Validation ignores surrounding whitespace, so the request body must too.
fn serialize_trimmed<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.trim())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required("email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}
