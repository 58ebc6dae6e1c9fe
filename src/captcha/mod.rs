//! Captcha subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/captcha
//!     → store.rs (draw answer + id, sweep expired, insert)
//!     → canvas.rs (background, Bresenham noise lines, dots, glyphs)
//!     → png.rs (PNG bytes → base64 data URI)
//!
//! POST /api/captcha/verify
//!     → store.rs (lookup, expiry, case-insensitive compare, consume)
//! ```
//!
//! # Design Decisions
//! - Not part of the authenticated chain; guards unauthenticated entry points
//! - Failure reasons are logged, never returned to the caller
//! - Cleanup piggybacks on issue; no timer task

pub mod canvas;
pub mod font;
pub mod handlers;
pub mod png;
pub mod store;

pub use store::{CaptchaStore, IssuedCaptcha};
