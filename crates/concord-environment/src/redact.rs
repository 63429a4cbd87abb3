// SPDX-License-Identifier: MIT
//! The Capitalizer leak-redaction scan (§4.1 step 2, invariant 8): the
//! model is instructed never to quote monologue text verbatim, but the
//! Environment enforces it regardless, since a prompt instruction is not a
//! guarantee against an untrusted model output.
use concord_schema::ActionLogEntry;

const MIN_LEAK_LENGTH: usize = 20;

/// Redact any substring of `hint` longer than 20 characters that also
/// appears in another actor's private monologue, split into fragments on
/// sentence punctuation.
pub fn redact_leaks(hint: &str, recent: &[ActionLogEntry]) -> String {
    let mut redacted = hint.to_string();
    for entry in recent {
        let Some(monologue) = entry.monologue() else { continue };
        for fragment in sentence_fragments(monologue) {
            if fragment.len() > MIN_LEAK_LENGTH && redacted.contains(fragment.as_str()) {
                redacted = redacted.replace(fragment.as_str(), "[redacted]");
            }
        }
    }
    redacted
}

fn sentence_fragments(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
