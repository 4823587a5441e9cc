#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use site_schedule::{AppConfig, InMemoryScheduleStore, http_api};

    let config = AppConfig::from_env()?;
    site_schedule::config::init_tracing(config.log_json, "info");

    let backend: http_api::SharedBackend = match &config.db_path {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            tracing::info!(path = %path.display(), "using sqlite backend");
            Arc::new(site_schedule::SqliteScheduleStore::new(path)?)
        }
        #[cfg(not(feature = "sqlite"))]
        Some(path) => {
            tracing::warn!(path = %path.display(), "sqlite feature disabled, using in-memory backend");
            Arc::new(InMemoryScheduleStore::new())
        }
        None => Arc::new(InMemoryScheduleStore::new()),
    };

    tracing::info!(addr = %config.http_addr, "site-schedule HTTP API listening");
    http_api::serve(config.http_addr, backend).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
