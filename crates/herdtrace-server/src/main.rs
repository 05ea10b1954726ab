//! Server binary: load config, open and seed the database, serve.

use anyhow::Result;
use herdtrace_server::{config::Config, start_server, state::AppState};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();
    let state = AppState::new(config)?;

    start_server(state).await
}
