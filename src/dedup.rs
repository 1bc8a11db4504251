use std::collections::HashSet;

use tracing::debug;

use crate::places::Candidate;

/// Display-name keywords that mark a search hit as irrelevant to workspace
/// discovery regardless of its category tags.
const NAME_BLOCKLIST: &[&str] = &[
    "gas", "petrol", "fuel", "pharmacy", "hospital", "clinic", "bank", "atm", "gym", "fitness",
    "school",
];

/// Drops candidates already imported (by external place ID) or blocklisted by
/// name, then truncates to the per-invocation cap. Provider ranking order is
/// preserved.
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    known_ids: &HashSet<String>,
    max_results: usize,
) -> Vec<Candidate> {
    let total = candidates.len();
    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| !known_ids.contains(&candidate.place_id))
        .filter(|candidate| !is_blocklisted(&candidate.name))
        .collect();
    kept.truncate(max_results);

    debug!(
        total,
        kept = kept.len(),
        "filtered provider candidates"
    );
    kept
}

fn is_blocklisted(name: &str) -> bool {
    let lowered = name.to_lowercase();
    NAME_BLOCKLIST
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
