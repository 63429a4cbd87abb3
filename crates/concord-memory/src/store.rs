// SPDX-License-Identifier: MIT
//! Relational history of generations, agent profiles, episodes, their action
//! logs, and dynamically created agents. One `RelationalStore` per run;
//! every write is upsert-by-natural-key so a crashed-and-restarted
//! orchestrator can resume without duplicating rows.
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use concord_schema::{ActionLogEntry, EpochResult, Hyperparameters, NewAgentProvisioning};

use crate::error::MemoryError;
use crate::schema;

pub struct RelationalStore {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub id: String,
    pub agent_a_id: String,
    pub agent_b_id: String,
    pub agent_a_score: Option<i64>,
    pub agent_b_score: Option<i64>,
    pub termination_reason: String,
}

impl RelationalStore {
    pub fn open(path: &Path) -> Result<Self, MemoryError> {
        let conn = Connection::open(path)?;
        schema::migrate(&conn, Some(path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, MemoryError> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn, None)?;
        Ok(Self { conn })
    }

    /// Record (or update) a generation row, returning its row id.
    pub fn record_generation(
        &self,
        generation_number: i64,
        baseline_mean_score: Option<f64>,
        accepted_mutation_variant_id: Option<&str>,
    ) -> Result<i64, MemoryError> {
        self.conn.execute(
            r#"
            INSERT INTO generations (generation_number, created_at, baseline_mean_score, accepted_mutation_variant_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(generation_number) DO UPDATE SET
                baseline_mean_score = ?3,
                accepted_mutation_variant_id = ?4
            "#,
            params![generation_number, Utc::now().to_rfc3339(), baseline_mean_score, accepted_mutation_variant_id],
        )?;
        Ok(self.conn.query_row(
            "SELECT id FROM generations WHERE generation_number = ?1",
            [generation_number],
            |row| row.get(0),
        )?)
    }

    pub fn upsert_agent_profile(
        &self,
        agent_id: &str,
        archetype: &str,
        strategy_text: &str,
        hyperparameters: &Hyperparameters,
        is_created_agent: bool,
    ) -> Result<(), MemoryError> {
        let hyperparameters_json = serde_json::to_string(hyperparameters)?;
        self.conn.execute(
            r#"
            INSERT INTO agent_profiles (agent_id, archetype, strategy_text, hyperparameters, is_created_agent, status)
            VALUES (?1, ?2, ?3, ?4, ?5, 'active')
            ON CONFLICT(agent_id) DO UPDATE SET
                archetype = ?2,
                strategy_text = ?3,
                hyperparameters = ?4
            "#,
            params![agent_id, archetype, strategy_text, hyperparameters_json, is_created_agent],
        )?;
        Ok(())
    }

    pub fn record_episode(
        &self,
        episode_id: &str,
        generation_id: i64,
        agent_a_id: &str,
        agent_b_id: &str,
        result: &EpochResult,
    ) -> Result<(), MemoryError> {
        let agent_a_score = result.score_for(agent_a_id);
        let agent_b_score = result.score_for(agent_b_id);
        let termination_reason = serde_json::to_value(result.termination_reason)?
            .as_str()
            .unwrap_or_default()
            .to_string();
        let final_state = serde_json::to_string(&result.final_state)?;

        self.conn.execute(
            r#"
            INSERT INTO episodes (id, generation_id, agent_a_id, agent_b_id, agent_a_score, agent_b_score, termination_reason, final_state)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                agent_a_score = ?5,
                agent_b_score = ?6,
                termination_reason = ?7,
                final_state = ?8
            "#,
            params![episode_id, generation_id, agent_a_id, agent_b_id, agent_a_score, agent_b_score, termination_reason, final_state],
        )?;
        Ok(())
    }

    pub fn append_action_log_entry(&self, episode_id: &str, entry: &ActionLogEntry) -> Result<(), MemoryError> {
        let turn = entry.turn();
        let entry_json = serde_json::to_string(entry)?;
        self.conn.execute(
            "INSERT INTO action_logs (episode_id, turn_number, entry) VALUES (?1, ?2, ?3)",
            params![episode_id, turn, entry_json],
        )?;
        Ok(())
    }

    pub fn record_created_agent(&self, generation_created: i64, provisioning: &NewAgentProvisioning) -> Result<(), MemoryError> {
        let provisioning_json = serde_json::to_string(provisioning)?;
        self.conn.execute(
            r#"
            INSERT INTO created_agents (agent_id, generation_created, archetype, provisioning, status)
            VALUES (?1, ?2, ?3, ?4, 'active')
            ON CONFLICT(agent_id) DO UPDATE SET provisioning = ?4
            "#,
            params![provisioning.agent_id, generation_created, provisioning.archetype, provisioning_json],
        )?;
        Ok(())
    }

    pub fn archive_created_agent(&self, agent_id: &str) -> Result<(), MemoryError> {
        self.conn.execute(
            "UPDATE created_agents SET status = 'archived' WHERE agent_id = ?1",
            [agent_id],
        )?;
        Ok(())
    }

    pub fn active_created_agent_count(&self) -> Result<usize, MemoryError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM created_agents WHERE status = 'active'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Episodes for one generation, ordered by `agent_a_score` descending —
    /// the index on `(generation_id, agent_a_score)` exists for this query.
    pub fn episodes_for_generation(&self, generation_id: i64) -> Result<Vec<EpisodeSummary>, MemoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, agent_a_id, agent_b_id, agent_a_score, agent_b_score, termination_reason
            FROM episodes
            WHERE generation_id = ?1
            ORDER BY agent_a_score DESC
            "#,
        )?;
        let rows = stmt
            .query_map([generation_id], |row| {
                Ok(EpisodeSummary {
                    id: row.get(0)?,
                    agent_a_id: row.get(1)?,
                    agent_b_id: row.get(2)?,
                    agent_a_score: row.get(3)?,
                    agent_b_score: row.get(4)?,
                    termination_reason: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Full action log for one episode, ordered by turn — the index on
    /// `(episode_id, turn_number)` exists for this query.
    pub fn action_log_for_episode(&self, episode_id: &str) -> Result<Vec<ActionLogEntry>, MemoryError> {
        let mut stmt = self.conn.prepare(
            "SELECT entry FROM action_logs WHERE episode_id = ?1 ORDER BY turn_number",
        )?;
        let rows = stmt
            .query_map([episode_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter().map(|json| Ok(serde_json::from_str(json)?)).collect()
    }

    pub fn agent_profile_strategy(&self, agent_id: &str) -> Result<Option<String>, MemoryError> {
        Ok(self
            .conn
            .query_row(
                "SELECT strategy_text FROM agent_profiles WHERE agent_id = ?1",
                [agent_id],
                |row| row.get(0),
            )
            .optional()?)
    }
}
