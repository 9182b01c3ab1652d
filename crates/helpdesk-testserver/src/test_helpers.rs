use tokio::net::TcpListener;

use crate::state::{AppState, InnerAppState};

/// A running test server. `state` is shared with the router so tests can
/// seed data, count requests or expire sessions behind the client's back.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn the server on a random port (e.g. "http://127.0.0.1:12345").
///
/// Panics if the socket cannot be bound; only meant for tests.
pub async fn spawn_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let base_url = format!("http://{addr}");
    let state = InnerAppState::shared();
    let app = crate::build_router(state.clone());
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("test server stopped: {e}");
        }
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}
