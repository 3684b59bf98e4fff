use arbai::config::Config;
use arbai::routes::{build_router, AppState};
use arbai::{db, logging};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let _ = logging::cleanup_old_logs();

    if let Err(e) = db::init_database(&config.db_path()) {
        eprintln!("Failed to initialize database: {}", e);
        std::process::exit(1);
    }

    let base_port = config.port;
    let state = Arc::new(AppState::new(config));
    let router = build_router(state);

    // Try the configured port first, then a few alternatives so parallel
    // dev instances can coexist.
    for offset in 0..=10u16 {
        let addr = SocketAddr::from(([127, 0, 0, 1], base_port + offset));
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                logging::log_conversation(&format!("3RBAI listening on http://{}", addr));
                if let Err(e) = axum::serve(listener, router).await {
                    logging::log_error(&format!("Server error: {}", e));
                    std::process::exit(1);
                }
                return;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => continue,
            Err(e) => {
                logging::log_error(&format!("Failed to bind {}: {}", addr, e));
                std::process::exit(1);
            }
        }
    }

    logging::log_error(&format!(
        "All ports ({} to {}) are in use",
        base_port,
        base_port + 10
    ));
    std::process::exit(1);
}
