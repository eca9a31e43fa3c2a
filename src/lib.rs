//! Root crate facade for the PACBoard API server.

pub use pacboard_server::{
    config, create_app, error, handlers, models, resolve_bind_address, serve_router, store,
    AppError, AppState, Category, Config, Library, DEFAULT_PORT,
};
