//! Request ingestion and abuse control for a portfolio site's API.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routes;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routes::Backends;
