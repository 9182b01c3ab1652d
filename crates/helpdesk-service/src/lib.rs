mod blocking;
mod http;
mod session;
mod traits;

pub use blocking::BlockingHttpService;
pub use http::HttpService;
pub use session::{SessionError, SessionStore};
pub use traits::{HelpdeskApi, ServiceError};
