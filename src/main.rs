use tokio::net::TcpListener;
use tracing::{error, info};
use tripmate::{
    config::AppConfig,
    db::{init_pool, run_migrations},
    error::AppError,
    routes::create_router,
    services::{mailer::build_mailer, storage::MediaStorage},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let db = init_pool(&config.database_url).await?;

    if let Err(err) = run_migrations(&db).await {
        error!("migration failed: {err:?}");
        return Err(err);
    }

    let storage = MediaStorage::new(config.media_root.clone(), &config.media_url);
    storage.ensure_structure().await?;

    let mailer = build_mailer(config.smtp.as_ref(), &config.mail_from)?;
    if config.smtp.is_none() {
        info!("SMTP_HOST not set, outgoing mail goes to the log");
    }

    let state = AppState::new(config.clone(), db, storage, mailer);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tripmate=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
