//! services/api/src/bin/seed.rs
//!
//! Resets the configured database and fills it with demo data.

use api_lib::{adapters::DbAdapter, config::Config, error::ApiError, seed};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Seeding {}", config.database_url);
    let db = DbAdapter::connect(&config.database_url).await?;
    db.run_migrations().await?;

    let summary = seed::seed(&db).await?;
    info!(
        "Created {} users, {} courses, {} enrollments, {} achievements",
        summary.users, summary.courses, summary.enrollments, summary.achievements
    );
    info!("Demo accounts use the password '{}'", seed::DEMO_PASSWORD);
    Ok(())
}
