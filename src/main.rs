//! live-rooms: HTTP and WebSocket server for live session rooms.

use std::sync::Arc;

use http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use live_rooms::adapters::{
    live_router, ConnectionHub, InMemorySessionStore, PostgresSessionStore, WebSocketState,
};
use live_rooms::application::{
    ChatFanout, CommandDispatcher, MembershipRegistry, RoomSequencer, SessionRegistry,
    SignalingRelay,
};
use live_rooms::config::{AppConfig, DatabaseConfig, ServerConfig};
use live_rooms::ports::{BroadcastBus, SessionStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let store = session_store(config.database.as_ref()).await?;

    let membership = MembershipRegistry::new();
    let hub = Arc::new(ConnectionHub::new(
        membership.clone(),
        config.realtime.connection_buffer,
    ));
    let bus: Arc<dyn BroadcastBus> = hub.clone();
    let sequencer = Arc::new(RoomSequencer::new());

    let registry = Arc::new(SessionRegistry::new(
        store.clone(),
        bus.clone(),
        sequencer.clone(),
    ));
    let chat = Arc::new(ChatFanout::new(
        store,
        bus.clone(),
        sequencer,
        config.realtime.chat_policy(),
    ));
    let relay = Arc::new(SignalingRelay::new(membership, bus));
    let dispatcher = CommandDispatcher::new(chat.clone(), relay);

    let app = live_router(registry, chat, WebSocketState::new(hub, dispatcher)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(config.server.request_timeout()))
            .layer(cors_layer(&config.server)),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "live-rooms listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("live-rooms stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn session_store(database: Option<&DatabaseConfig>) -> Result<Arc<dyn SessionStore>, BoxError> {
    let Some(database) = database else {
        tracing::info!("No database configured, sessions are kept in memory");
        return Ok(Arc::new(InMemorySessionStore::new()));
    };

    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.connect_timeout())
        .connect(&database.url)
        .await?;

    let store = PostgresSessionStore::new(pool);
    if database.run_migrations {
        store.migrate().await?;
        tracing::info!("Database migrations applied");
    }
    Ok(Arc::new(store))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
