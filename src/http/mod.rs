//! HTTP surface of the gate.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (request ID assigned or propagated)
//!     → server.rs (trace span, timeout)
//!     → rate gate → [auth gate → permission gate] → handler
//!     → error.rs renders any denial as JSON
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
