//! The judge service binary: wires together configuration, logging, the
//! optional persistence sink, and the HTTP surface (`spec.md` §6).

use std::sync::Arc;

use tokio::net::TcpListener;

use judge_service::config::AppConfig;
use judge_service::persistence::PersistenceSink;
use judge_service::routes::{self, AppState};
use judge_service::logging;

#[tokio::main]
async fn main() {
    logging::init();

    let config = AppConfig::from_env();
    log::info!("starting judge-service on port {} (replica={}, host={})", config.port, config.replica_name, config.hostname);

    let persistence = match &config.database_url {
        Some(url) => match PersistenceSink::connect(url).await {
            Ok(sink) => Some(Arc::new(sink)),
            Err(e) => {
                log::error!("failed to connect to persistence store at startup: {}; submit will report saved_to_db=false", e);
                None
            }
        },
        None => {
            log::warn!("DATABASE_URL not set; submit requests will not be persisted");
            None
        }
    };

    let state = AppState { config: Arc::new(config.clone()), persistence };
    let app = routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .unwrap_or_else(|e| panic!("failed to bind to port {}: {}", config.port, e));

    log::info!("judge-service listening on {}", listener.local_addr().expect("bound listener has a local address"));

    axum::serve(listener, app).await.expect("http server exited unexpectedly");
}
