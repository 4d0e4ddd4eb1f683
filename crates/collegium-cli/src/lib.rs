//! # Collegium CLI
//!
//! Administrative tooling for a Collegium database: account bootstrap and
//! fake-data seeding for development.
//!
//! ## Usage
//!
//! ```ignore
//! use collegium_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(4).with_courses(6);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
