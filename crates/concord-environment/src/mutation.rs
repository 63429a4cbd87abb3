// SPDX-License-Identifier: MIT
use serde_json::{Map, Value};
use tracing::debug;

use concord_schema::{AgentPermissions, MutationAction, StateMutation};

/// Primary actors carry no permissions record and are unrestricted; a
/// created agent's permissions gate every mutation it proposes (§4.1 step
/// 6, invariant 3).
pub fn permission_allows(permissions: Option<&AgentPermissions>, path: &str) -> bool {
    match permissions {
        None => true,
        Some(p) => p.allows(path),
    }
}

/// Apply one mutation's dotted path against `variables` (§4.1 step 7).
/// `add` creates any missing intermediate object node; `modify` no-ops
/// silently (logged at `debug!`) the moment an intermediate node is
/// missing, per the `applyMutation` contract. `StateMutation::value` is
/// already an owned `serde_json::Value` tree, so cloning it into place is
/// already a deep copy.
pub fn apply_mutation(variables: &mut Map<String, Value>, mutation: &StateMutation) {
    let parts: Vec<&str> = mutation.path.split('.').collect();
    let Some((leaf, parents)) = parts.split_last() else { return };

    let mut current = variables;
    for segment in parents {
        match mutation.action {
            MutationAction::Add => {
                let entry = current.entry(segment.to_string()).or_insert_with(|| Value::Object(Map::new()));
                match entry {
                    Value::Object(m) => current = m,
                    _ => {
                        debug!(path = %mutation.path, segment, "add mutation blocked by a non-object node");
                        return;
                    }
                }
            }
            MutationAction::Modify => match current.get_mut(*segment) {
                Some(Value::Object(m)) => current = m,
                _ => {
                    debug!(path = %mutation.path, segment, "modify mutation is a no-op: intermediate node missing");
                    return;
                }
            },
        }
    }

    current.insert((*leaf).to_string(), mutation.value.clone());
}
