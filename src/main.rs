use anyhow::Result;
use tracing::info;

use sheet_translator::config::Settings;
use sheet_translator::config_store::EnvSource;
use sheet_translator::logging;
use sheet_translator::routes;
use sheet_translator::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; values may come from the real environment.
    let dotenv = dotenvy::dotenv();

    logging::init();

    match dotenv {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => tracing::debug!("No .env file loaded: {}", e),
    }

    let settings = Settings::load(None)?;
    info!(
        "Settings: database={:?}, config_file={:?}, upload_dir={:?}, max_upload={} bytes",
        settings.storage.database_path,
        settings.storage.config_file,
        settings.storage.upload_dir,
        settings.upload.max_bytes
    );

    let addr = settings.bind_address();
    let app_state = AppState::new(settings, EnvSource::from_process_env())?;
    info!("Initialized storage and translation client");

    let app = routes::app(app_state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
