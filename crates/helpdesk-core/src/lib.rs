pub mod error;
pub mod form;
pub mod session;
pub mod stats;
pub mod ticket;
pub mod user;

pub use error::ValidationError;
pub use form::{LoginForm, SignupForm, StatusUpdate, TicketDraft, TicketInput};
pub use session::{Session, TokenResponse};
pub use stats::TicketStats;
pub use ticket::{RequestPriority, RequestStatus, RequestType, Ticket, TicketFilter};
pub use user::{ClientSummary, Role, User};
