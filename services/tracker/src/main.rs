use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::database::{DatabaseConfig, init_pool};
use tracker::{
    AppState,
    clients::{HolidayApiClient, HrApiClient, WebhookClient},
    repositories::{Repository, SqliteRepository},
    routes,
    scheduler::{ReminderScheduler, ReminderService},
    settings::Settings,
    shutdown::shutdown_signal,
    usecase::WorkService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    info!("Starting worktime service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let repository = SqliteRepository::new(pool.clone());
    repository.migrate().await?;
    let repository: Arc<dyn Repository> = Arc::new(repository);

    // Outbound clients
    let timeout = settings.http_timeout();
    let hr_api = Arc::new(HrApiClient::new(timeout)?);
    let holidays = Arc::new(HolidayApiClient::new(settings.holiday_api_url.clone(), timeout)?);
    let webhook = Arc::new(WebhookClient::new(timeout)?);

    let work_service = WorkService::new(repository.clone(), hr_api.clone());
    let reminders = ReminderService::new(repository, hr_api, holidays, webhook);
    let scheduler = ReminderScheduler::start(reminders).await?;

    let state = AppState {
        db_pool: pool,
        work_service,
    };
    let app = routes::create_router(state, &settings.static_dir);
    info!("Serving frontend from {}", settings.static_dir.display());

    let addr = settings.server.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Worktime service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    info!("Worktime service stopped");

    Ok(())
}
