#![forbid(unsafe_code)]

//! Pure achievement-progress domain: vectors, catalog, routing, projection.
//!
//! Nothing here performs I/O. Storage and the update transaction live in the
//! `storage` and `services` crates.

pub mod catalog;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod projector;
pub mod router;
pub mod time;

pub use catalog::{AchievementDefinition, Catalog};
pub use config::EngineConfig;
pub use detector::detect_completions;
pub use error::ConfigError;
pub use projector::project;
pub use router::{ProjectionRule, Route, RoutingTable};
pub use time::Clock;
