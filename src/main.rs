use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use showfloor::{auth, state::AppState, store::MemoryStore, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "showfloor=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting showfloor...");

    // Initialize GM authentication config
    let auth_config = Arc::new(auth::AuthConfig::from_env());

    // The document store every client shares
    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(store));

    // Protected GM route (with HTTP Basic Auth)
    let gm_routes = Router::new()
        .route("/gm.html", get(auth::serve_gm_html))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::gm_auth_middleware,
        ));

    // WebSocket route; GM connections require the same credentials
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::gm_ws_auth_middleware,
        ));

    let app = Router::new()
        .merge(ws_routes)
        .merge(gm_routes)
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 4242));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
