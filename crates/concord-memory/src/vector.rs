// SPDX-License-Identifier: MIT
//! In-memory vector-similarity store for strategy-outcome embeddings: each
//! entry pairs an embedding of a mutation variant's strategy text with the
//! episode score it earned, so the Mutator can later retrieve strategies
//! similar to one it is about to propose. Bounded by a soft cap; once full,
//! zero-score (no-signal) entries are pruned first since they carry no
//! useful outcome information, then the oldest surviving entry is evicted.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyOutcome {
    pub agent_id: String,
    pub strategy_text: String,
    pub embedding: Vec<f32>,
    pub score: i8,
}

#[derive(Debug)]
pub struct VectorStore {
    entries: Vec<StrategyOutcome>,
    soft_cap: usize,
}

impl VectorStore {
    pub fn new(soft_cap: usize) -> Self {
        Self { entries: Vec::new(), soft_cap: soft_cap.max(1) }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a new outcome, pruning to stay at or under the soft cap.
    pub fn insert(&mut self, outcome: StrategyOutcome) {
        self.entries.push(outcome);
        self.prune();
    }

    fn prune(&mut self) {
        while self.entries.len() > self.soft_cap {
            if let Some(pos) = self.entries.iter().position(|e| e.score == 0) {
                self.entries.remove(pos);
            } else {
                self.entries.remove(0);
            }
        }
    }

    /// Top-`k` entries by cosine similarity to `query`, highest first.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<(&StrategyOutcome, f32)> {
        let mut scored: Vec<(&StrategyOutcome, f32)> =
            self.entries.iter().map(|e| (e, cosine_similarity(query, &e.embedding))).collect();
        scored.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
