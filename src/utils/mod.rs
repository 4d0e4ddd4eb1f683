//! Shared helpers used across feature modules.
//!
//! - [`image_cleanup`]: best-effort remote image deletion and its retry outbox
//! - [`profile_number`]: collision-tolerant `STU…`/`FAC…`/`ADM…` numbers

pub mod image_cleanup;
pub mod profile_number;
