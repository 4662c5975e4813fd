#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod progress_service;
mod transaction;

pub use progress_core::Clock;

pub use config::EngineSettings;
pub use error::ProgressError;
pub use progress_service::{AchievementProgress, EventOutcome, ProgressService};
