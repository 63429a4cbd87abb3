// SPDX-License-Identifier: MIT
//! Forward-only schema migrations, applied in ascending version order and
//! recorded one row per version in `schema_versions`. Each migration backs
//! up the database file before touching it — there is no down-migration,
//! so a bad roll-forward is recovered by restoring the backup, not by
//! running code in the other direction.
use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::MemoryError;

pub const SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
        CREATE TABLE IF NOT EXISTS generations (
            id                          INTEGER PRIMARY KEY,
            generation_number           INTEGER NOT NULL UNIQUE,
            created_at                  TEXT NOT NULL,
            baseline_mean_score         REAL,
            accepted_mutation_variant_id TEXT
        );

        CREATE TABLE IF NOT EXISTS agent_profiles (
            agent_id          TEXT PRIMARY KEY,
            archetype         TEXT NOT NULL,
            strategy_text     TEXT NOT NULL,
            hyperparameters   TEXT NOT NULL,
            is_created_agent  BOOLEAN NOT NULL DEFAULT 0,
            status            TEXT NOT NULL DEFAULT 'active'
        );

        CREATE TABLE IF NOT EXISTS episodes (
            id                  TEXT PRIMARY KEY,
            generation_id       INTEGER NOT NULL,
            agent_a_id          TEXT NOT NULL,
            agent_b_id          TEXT NOT NULL,
            agent_a_score       INTEGER,
            agent_b_score       INTEGER,
            termination_reason  TEXT NOT NULL,
            final_state         TEXT NOT NULL,
            FOREIGN KEY (generation_id) REFERENCES generations(id)
        );

        CREATE TABLE IF NOT EXISTS action_logs (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            episode_id   TEXT NOT NULL,
            turn_number  INTEGER NOT NULL,
            entry        TEXT NOT NULL,
            FOREIGN KEY (episode_id) REFERENCES episodes(id)
        );

        CREATE TABLE IF NOT EXISTS created_agents (
            agent_id            TEXT PRIMARY KEY,
            generation_created  INTEGER NOT NULL,
            archetype           TEXT NOT NULL,
            provisioning        TEXT NOT NULL,
            status              TEXT NOT NULL DEFAULT 'active',
            FOREIGN KEY (generation_created) REFERENCES generations(id)
        );

        CREATE TABLE IF NOT EXISTS schema_versions (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_episodes_generation_score ON episodes(generation_id, agent_a_score);
        CREATE INDEX IF NOT EXISTS idx_action_logs_episode_turn ON action_logs(episode_id, turn_number);
        CREATE INDEX IF NOT EXISTS idx_agent_profiles_status ON agent_profiles(status);
        CREATE INDEX IF NOT EXISTS idx_created_agents_status ON created_agents(status);
    "#,
}];

/// Bring `conn` up to `SCHEMA_VERSION`, applying any migration whose
/// version exceeds the database's current `PRAGMA user_version`. When
/// `backup_path` is given and at least one migration runs, the file is
/// copied to `<backup_path>.v<from>.bak` before the first migration in the
/// batch executes.
pub fn migrate(conn: &Connection, backup_path: Option<&Path>) -> Result<(), MemoryError> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        return Ok(());
    }

    if let Some(path) = backup_path {
        if path.exists() {
            let backup = path.with_extension(format!("v{current}.bak"));
            std::fs::copy(path, &backup)
                .map_err(|source| MemoryError::BackupFailed { from: current, to: SCHEMA_VERSION, source })?;
        }
    }

    for migration in pending {
        conn.execute_batch(migration.sql)?;
        conn.execute(&format!("PRAGMA user_version = {}", migration.version), [])?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_versions (version, applied_at) VALUES (?1, ?2)",
            params![migration.version, chrono::Utc::now().to_rfc3339()],
        )?;
    }

    Ok(())
}
