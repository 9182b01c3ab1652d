use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "helpdesk", about = "Terminal client for the helpdesk service")]
pub struct Config {
    /// Backend base URL
    #[arg(long, env = "HELPDESK_SERVER_URL", default_value = "http://localhost:8000")]
    pub server_url: String,

    /// Where the login session is persisted
    #[arg(long, env = "HELPDESK_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Log destination; the terminal itself is owned by the UI
    #[arg(long, env = "HELPDESK_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Connect timeout in seconds
    #[arg(long, env = "HELPDESK_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// Forget any stored session before starting
    #[arg(long)]
    pub logout: bool,
}

impl Config {
    pub fn session_path(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("session.json"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("helpdesk.log"))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

/// `$XDG_DATA_HOME/helpdesk`, falling back to `~/.local/share/helpdesk`.
pub fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("helpdesk")
}
