//! Caffeine - keeps the display awake for a selected timeout
//!
//! This is the main entry point for the caffeine server.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use caffeine::{
    api::{create_router, AppState},
    config::Config,
    controller::{SessionController, SessionHandle},
    services::{
        check_inhibit_available, DryRunKeepAlive, JsonFileStore, KeepAlive, LogObserver,
        MemoryStore, SettingsObserver, SettingsStore, SystemdInhibitor,
    },
    state::{SessionStore, StatusFanout},
    tasks::CountdownTicker,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("caffeine={},tower_http=info", config.log_level()))
        .init();

    info!("Starting caffeine server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, dim={}, debounce={}ms, dry_run={}",
        config.host, config.port, config.allow_dim, config.debounce_ms, config.dry_run
    );

    // The inhibitor is required unless we are only pretending
    let keep_alive: Box<dyn KeepAlive> = if config.dry_run {
        Box::new(DryRunKeepAlive::new())
    } else {
        if let Err(e) = check_inhibit_available().await {
            error!("{}", e);
            std::process::exit(1);
        }
        Box::new(SystemdInhibitor::new())
    };

    let settings_store: Arc<dyn SettingsStore> = match &config.state_file {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    };

    let saved = match settings_store.load() {
        Ok(saved) => saved,
        Err(e) => {
            warn!("Ignoring saved settings: {}", e);
            None
        }
    };

    let catalog = config.catalog(saved.as_ref());
    info!("Timeouts: {:?}", catalog.entries().iter().map(ToString::to_string).collect::<Vec<_>>());

    // Observers see every transition from here on
    let fanout = StatusFanout::new();
    fanout.register(Arc::new(LogObserver));
    fanout.register(Arc::new(SettingsObserver::new(
        Arc::clone(&settings_store),
        catalog.entries().to_vec(),
    )));

    let (ticker, ticks) = CountdownTicker::new();
    let mut controller = SessionController::new(
        SessionStore::new(catalog, fanout),
        ticker,
        keep_alive,
        config.controller_options(),
    );

    if let Some(saved) = &saved {
        if let Err(e) = controller.restore(saved) {
            error!("Failed to resume saved session: {}", e);
        }
    }

    let (session, session_task) = SessionHandle::spawn(controller, ticks);

    // Create HTTP router with all endpoints
    let app = create_router(Arc::new(AppState::new(session.clone())));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start        - Keep the display awake (optional {{\"timeout\": \"5m\"}})");
    info!("  POST /stop         - Let the display sleep");
    info!("  POST /toggle       - Start or stop with the current timeout");
    info!("  POST /next         - Switch to the next timeout now");
    info!("  POST /advance      - Debounced advance, as from a rapid tap");
    info!("  POST /restart      - Restart the countdown");
    info!("  POST /action/:name - Any of the above by name");
    info!("  GET  /status       - Current session and countdown");
    info!("  GET  /timeouts     - Selectable timeouts");
    info!("  GET  /health       - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Failed to install signal handlers: {}", e),
            }
        }
    }

    session.shutdown();
    if let Err(e) = session_task.await {
        error!("Session task ended abnormally: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
