// SPDX-License-Identifier: MIT
//! `turn_injection_logic` parsing and turn-order extension for
//! `Environment::mount_agent` (§4.1 "Mounting contract").

/// Parse `"speak_every_N_turns"`, defaulting to `1` on any parse failure
/// (unrecognized format, zero, non-numeric `N`).
pub fn parse_injection_frequency(spec: &str) -> u32 {
    spec.strip_prefix("speak_every_")
        .and_then(|rest| rest.strip_suffix("_turns"))
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// Insert `new_id` into `turn_order` after every `frequency`-th existing
/// slot. A created agent mounted with `speak_every_3_turns` into a 6-actor
/// roster gets two slots, after the 3rd and 6th existing entries.
pub fn extend_turn_order(turn_order: &mut Vec<String>, new_id: &str, frequency: u32) {
    let frequency = frequency.max(1) as usize;
    let original = std::mem::take(turn_order);
    let mut extended = Vec::with_capacity(original.len() + original.len() / frequency + 1);
    for (i, id) in original.into_iter().enumerate() {
        extended.push(id);
        if (i + 1) % frequency == 0 {
            extended.push(new_id.to_string());
        }
    }
    if !extended.contains(&new_id.to_string()) {
        extended.push(new_id.to_string());
    }
    *turn_order = extended;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_spec() {
        assert_eq!(parse_injection_frequency("speak_every_3_turns"), 3);
    }

    #[test]
    fn defaults_to_one_on_malformed_spec() {
        assert_eq!(parse_injection_frequency("whenever it feels like it"), 1);
        assert_eq!(parse_injection_frequency("speak_every_0_turns"), 1);
    }

    #[test]
    fn extends_after_every_nth_slot() {
        let mut order: Vec<String> = (1..=6).map(|i| format!("actor-{i}")).collect();
        extend_turn_order(&mut order, "mediator", 3);
        assert_eq!(
            order,
            vec!["actor-1", "actor-2", "actor-3", "mediator", "actor-4", "actor-5", "actor-6", "mediator"]
        );
    }

    #[test]
    fn appends_once_when_frequency_exceeds_roster_size() {
        let mut order: Vec<String> = vec!["actor-1".into(), "actor-2".into()];
        extend_turn_order(&mut order, "mediator", 10);
        assert_eq!(order, vec!["actor-1", "actor-2", "mediator"]);
    }
}
