use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

mod app;
mod auth;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gitavani_gateway=info,gitavani_notify=info,gitavani_scheduler=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    // load config: explicit path > GITAVANI_CONFIG env > ~/.gitavani/gitavani.toml
    let config_path = std::env::var("GITAVANI_CONFIG").ok();
    let config = gitavani_core::GitavaniConfig::load(config_path.as_deref())?;

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    // initialize SQLite database — single file for all subsystems
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    // run all schema migrations (idempotent)
    gitavani_users::db::init_db(&db)?;
    gitavani_notify::db::init_db(&db)?;
    info!("database migrations complete");

    // build subsystems — each gets its own connection for thread safety
    let users = Arc::new(gitavani_users::UserStore::new(rusqlite::Connection::open(
        db_path,
    )?));
    let records = Arc::new(gitavani_notify::NotificationStore::new(
        rusqlite::Connection::open(db_path)?,
    ));

    let provider = gitavani_quotes::gemini::GeminiProvider::new(
        config.provider.api_key.clone(),
        config.provider.base_url.clone(),
        config.provider.model.clone(),
        Duration::from_secs(config.provider.timeout_secs),
    );
    let quotes = Arc::new(gitavani_quotes::QuoteService::new(
        Box::new(provider),
        config.notifications.corpus_probability,
    ));

    let push = Arc::new(gitavani_notify::FcmGateway::new(
        config.push.server_key.clone(),
        config.push.endpoint.clone(),
        Duration::from_secs(config.push.timeout_secs),
    ));

    let dispatcher = gitavani_notify::Dispatcher::new(
        Arc::clone(&users),
        Arc::clone(&records),
        push,
        config.notifications.clone(),
    );
    let runner = Arc::new(gitavani_notify::BatchRunner::new(
        Arc::clone(&users),
        Arc::clone(&records),
        quotes,
        dispatcher,
        config.notifications.clone(),
    ));

    let job = Arc::new(gitavani_scheduler::DailyQuoteJob::new(Arc::clone(&runner)));
    let scheduler =
        gitavani_scheduler::DailyQuoteScheduler::new(job, config.scheduler.clone());
    scheduler.start();

    let state = Arc::new(app::AppState::new(
        config, users, records, runner, scheduler,
    ));
    let router = app::build_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Gitavani gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    state.scheduler.stop();
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
