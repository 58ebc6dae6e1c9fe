//! Permission evaluation subsystem.
//!
//! # Data Flow
//! ```text
//! Authenticated subject id
//!     → loader.rs (collaborator call, bounded by deadline)
//!     → set.rs (PermissionSet::build: trim, dedupe, wildcard flag)
//!     → attached to RequestContext by the auth gate
//!     → middleware.rs (per-route RequiredPermissions, any-of)
//! ```
//!
//! # Design Decisions
//! - Wire format `module:resource:action`; `*:*:*` is modelled as
//!   `Permission::Wildcard`
//! - Missing context denies
//! - OR across a route's required permissions

pub mod loader;
pub mod middleware;
pub mod set;

pub use loader::{load_with_deadline, PermissionLoader, StaticPermissionLoader};
pub use middleware::{require_permissions, RequiredPermissions};
pub use set::{check, Permission, PermissionSet, WILDCARD};
