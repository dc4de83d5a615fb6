use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backport_bot::config::BotConfig;
use backport_bot::git::backport::GitBackport;
use backport_bot::git::{CommitIdentity, ensure_clone};
use backport_bot::github::OctocrabClient;
use backport_bot::server::{AppState, build_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backport_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("BOT_CONFIG").unwrap_or_else(|_| "bot.toml".to_string());
    let config = BotConfig::load(std::path::Path::new(&config_path))?;

    let token = std::env::var("GITHUB_TOKEN")?;
    let webhook_secret = std::env::var("GH_WEBHOOK_SECRET")?;

    let github = OctocrabClient::from_token(&token, config.repository.clone())?;

    ensure_clone(&config.git_dir, &config.repository, &token)?;
    let git = GitBackport::new(
        config.git_dir.clone(),
        CommitIdentity {
            name: config.bot_login.clone(),
            email: format!("{}@users.noreply.github.com", config.bot_login),
        },
    );

    let state = AppState::new(
        config,
        webhook_secret.into_bytes(),
        Arc::new(github),
        Arc::new(git),
    );
    let app = build_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
