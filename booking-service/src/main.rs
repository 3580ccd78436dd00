use booking_service::config::BookingConfig;
use booking_service::services::init_metrics;
use booking_service::startup::Application;
use service_core::error::AppError;
use service_core::observability::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = BookingConfig::load()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = env!("CARGO_PKG_VERSION"),
        smtp_host = %config.smtp.host,
        smtp_port = config.smtp.port,
        "Starting booking service"
    );

    let app = Application::build(config).await?;
    let result = app.run_until_stopped().await;

    tracing::info!("Booking service stopped");
    shutdown_tracing();

    result.map_err(AppError::from)
}
