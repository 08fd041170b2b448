//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, background tasks)
//!     → request_id.rs (normalize or generate x-request-id)
//!     → [routes: identity, rate limit, handler]
//!     → request.rs (bounded read, UTF-8, JSON, validation)
//!     → response.rs (envelope, security headers)
//!     → Send to client
//! ```

pub mod request;
pub mod request_id;
pub mod response;
pub mod server;

pub use request::{parse_json_request, IngestRejection, ReadOptions};
pub use request_id::{RequestId, X_REQUEST_ID};
pub use response::{error_response, json_response};
pub use server::{AppState, HttpServer};
