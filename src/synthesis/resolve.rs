//! Shortest-candidate selection among competing parallel trenches.

use hashbrown::HashMap;
use log::debug;

use super::parallel::TrenchCandidate;
use crate::geometry::Side;
use crate::model::SegmentId;

/// Keeps the shortest candidate per `(street segment, side)` and drops the
/// rest. Groups are visited in segment order and candidates are sorted by
/// `(length, start, end)` first, so ties resolve to the lowest corner pair
/// no matter how the candidates were enumerated.
pub(crate) fn resolve_candidates(candidates: Vec<TrenchCandidate>) -> Vec<TrenchCandidate> {
    let mut groups: HashMap<(SegmentId, Side), Vec<TrenchCandidate>> = HashMap::new();
    for candidate in candidates {
        groups
            .entry((candidate.segment, candidate.side))
            .or_default()
            .push(candidate);
    }

    let mut keys: Vec<(SegmentId, Side)> = groups.keys().copied().collect();
    keys.sort_unstable();

    let mut winners = Vec::with_capacity(keys.len());
    let mut invalidated = 0usize;
    for key in keys {
        let Some(mut group) = groups.remove(&key) else {
            continue;
        };
        group.sort_by(|a, b| {
            a.length
                .total_cmp(&b.length)
                .then(a.start.cmp(&b.start))
                .then(a.end.cmp(&b.end))
        });
        invalidated += group.len() - 1;
        if let Some(shortest) = group.into_iter().next() {
            winners.push(shortest);
        }
    }

    if invalidated > 0 {
        debug!("Invalidated {invalidated} longer trench candidates");
    }
    winners
}
