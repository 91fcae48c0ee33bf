//! View-count ordering and dense rank assignment.

use trendshorts_core::Candidate;

/// Stable sort by `view_count`, highest first. Ties keep their relative order.
pub fn sort_by_views(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.view_count.cmp(&a.view_count));
}

/// Sorts by views and assigns ranks `1..=N` by position.
#[must_use]
pub fn assign_ranks(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    sort_by_views(&mut candidates);
    for (position, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = Some(u32::try_from(position + 1).unwrap_or(u32::MAX));
    }
    candidates
}
