use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::services::ConversionService;
use crate::uploads::UploadSessions;

/// Running application: the HTTP server task
///
/// The server owns the only shared state (pending uploads per session);
/// conversions themselves are stateless.
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build the router from configuration and spawn the server
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");
        info!("Reporting period: {}", config.reporting_period);

        let app_state = AppState {
            conversion_service: ConversionService::new(config.reporting_period.clone()),
            sessions: UploadSessions::with_idle_timeout(config.session_idle_timeout),
            output_file_name: config.output_file_name.clone(),
            max_upload_bytes: config.max_upload_bytes,
        };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
