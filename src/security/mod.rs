//! Admission subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (resolve client key from proxy headers / peer)
//!     → rate_limit.rs (take one token from the client's bucket)
//!     → Pass to authentication (protected routes) or handler (public routes)
//! ```
//!
//! # Design Decisions
//! - Applied to every route, public ones included
//! - Fail closed: reject when the bucket is empty; never retry internally
//! - Header-derived keys are taken as given; deploy behind a proxy that
//!   overwrites them

pub mod client_ip;
pub mod rate_limit;

pub use client_ip::{client_key, FALLBACK_KEY};
pub use rate_limit::{rate_limit_middleware, RateLimitSettings, RateLimiter};
