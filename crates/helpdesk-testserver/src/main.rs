use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use helpdesk_testserver::InnerAppState;

#[derive(Parser)]
#[command(
    name = "helpdesk-mock-server",
    about = "In-memory helpdesk backend for trying out the terminal client"
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "HELPDESK_MOCK_BIND", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Create a demo client and support account (password "demo")
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let state = InnerAppState::shared();

    if cli.seed {
        let mut store = state.store();
        for (name, email) in [
            ("Demo Client", "client@example.com"),
            ("Demo Support", "agent@support.example.com"),
        ] {
            if let Some(user) = store.create_account(name, email, "demo") {
                info!(email = %user.email, role = %user.role, "seeded account");
            }
        }
    }

    let listener = TcpListener::bind(cli.bind).await?;
    info!("helpdesk-mock-server listening on http://{}", cli.bind);
    axum::serve(listener, helpdesk_testserver::build_router(state)).await?;
    Ok(())
}
