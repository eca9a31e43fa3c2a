//! HTTP server wiring for PACBoard (API routes, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for category and login endpoints.
pub mod handlers;

pub use pacboard_core::{
    config, models, store, AppError, Category, Config, Library, DEFAULT_PORT,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use pacboard_core::models::{Album, Event, Issue, ReadingCircleEntry};
use pacboard_core::store::Catalogued;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<Library>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `library`: Opened category collections.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(config: Config, library: Library) -> Self {
        Self {
            library: Arc::new(library),
            config: Arc::new(config),
        }
    }

    /// Open the library at `config.storage_root` and wrap both in state.
    ///
    /// # Errors
    /// Returns an error when the storage folders cannot be initialized.
    pub fn open(config: Config) -> Result<Self, AppError> {
        let library = Library::open(&config.storage_root)?;
        Ok(Self::new(config, library))
    }
}

/// Route paths of one category, as the admin frontend calls them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRoutes {
    pub upload: &'static str,
    pub list: &'static str,
    pub delete: &'static str,
}

impl CategoryRoutes {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::PacTimes => Self {
                upload: "/upload_pac_times",
                list: "/get_pac_times",
                delete: "/delete_pac_times",
            },
            Category::PacEvents => Self {
                upload: "/upload_pac_event",
                list: "/get_pac_events",
                delete: "/delete_pac_event",
            },
            Category::ReadingCircle => Self {
                upload: "/upload_reading_circle",
                list: "/get_reading_circle",
                delete: "/delete_reading_circle",
            },
            Category::PhotoAlbums => Self {
                upload: "/upload_photo_album",
                list: "/get_photo_albums",
                delete: "/delete_photo_album",
            },
        }
    }
}

fn category_routes<E: Catalogued>() -> Router<AppState> {
    let routes = CategoryRoutes::for_category(E::CATEGORY);
    Router::new()
        .route(routes.upload, post(handlers::entry::upload::<E>))
        .route(routes.list, get(handlers::entry::list::<E>))
        .route(
            &format!("{}/:number", routes.delete),
            delete(handlers::entry::remove::<E>),
        )
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

/// Origins allowed by CORS when public access is disabled.
fn allowed_origins(config: &Config, cors_port: u16) -> Vec<HeaderValue> {
    let local = [
        format!("http://localhost:{}", cors_port),
        format!("http://127.0.0.1:{}", cors_port),
    ];
    config
        .allowed_origins
        .iter()
        .cloned()
        .chain(local)
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, err);
                None
            }
        })
        .collect()
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let methods = [Method::GET, Method::POST, Method::DELETE];
    let cors = if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed_origins(&state.config, cors_port)))
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    };

    let static_files = ServeDir::new(state.library.root());
    let body_limit = state.config.max_upload_size;

    Router::new()
        .merge(category_routes::<Issue>())
        .merge(category_routes::<Event>())
        .merge(category_routes::<ReadingCircleEntry>())
        .merge(category_routes::<Album>())
        .route("/handle_login", post(handlers::auth::handle_login))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
        )
        .nest_service(pacboard_core::constants::STATIC_URL_PREFIX, static_files)
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
