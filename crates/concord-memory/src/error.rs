// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to (de)serialize a stored record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to back up the database before migrating from version {from} to {to}: {source}")]
    BackupFailed { from: i64, to: i64, #[source] source: std::io::Error },

    #[error("no migration path defined from schema version {found} to {expected}")]
    NoMigrationPath { found: i64, expected: i64 },
}
