#![forbid(unsafe_code)]

//! Persistence collaborator for the progress engine.

pub mod codec;
pub mod repository;
pub mod sqlite;

pub use repository::{
    CommitBatch, InMemoryRepository, ProgressPersistence, ProgressRecord, ProgressRepository,
    RecordWrite, Storage, StorageError,
};
