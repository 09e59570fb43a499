//! Internal pipeline stages, leaves first:
//!
//! 1. [`source`]    — enumerate the page-image producer's output into jobs
//! 2. [`api`]       — one physical call to the translation API
//! 3. [`transport`] — bounded physical retries around one logical attempt
//! 4. [`attempt`]   — bounded logical attempts + validation for one page
//!
//! The engine ([`crate::engine`]) orchestrates these across the selected
//! range.

pub mod api;
pub mod attempt;
pub mod source;
pub mod transport;
