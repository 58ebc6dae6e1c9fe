//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (already admitted by the rate gate):
//!     → extract.rs (header, then query, then cookie)
//!     → token.rs (secret configured? signature, structure, expiry)
//!     → permission loader (bounded by deadline)
//!     → context.rs (RequestContext inserted into extensions)
//!     → permission gate
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing secret is a server error, never a pass
//! - Verification only; tokens are issued elsewhere
//! - Context is typed; no string-keyed lookups

pub mod context;
pub mod extract;
pub mod middleware;
pub mod token;

pub use context::RequestContext;
pub use token::{Claims, TokenVerifier};
