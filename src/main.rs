use build_mock_api::config;
use build_mock_api::routes::app;
use build_mock_api::state::AppState;
use build_mock_api::store::JsonStore;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up PORT, DB_PATH, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("starting mock API in {:?} mode", config.environment);

    let store = JsonStore::open(&config.store.db_path, config.store.pretty_writes)
        .unwrap_or_else(|e| panic!("failed to open store {}: {}", config.store.db_path, e));

    let app = app(AppState::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("mock API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
