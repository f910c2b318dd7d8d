//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum catch-all router, request id layers)
//!     → dispatch: route table → security gate → body limit
//!         → StandardHandler::handle | downstream::forward_request
//!         → ErrorMapper on any failure
//!     → metrics + access log
//!     → Send to client
//! ```

pub mod request;
pub mod server;
pub mod tls;

pub use request::{request_id_of, X_REQUEST_ID};
pub use server::{dispatch, AppState, HttpServer};
pub use tls::load_tls_config;
