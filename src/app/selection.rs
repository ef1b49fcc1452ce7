//! Least-cloud candidate selection

use std::cmp::Ordering;

use crate::app::models::Candidate;

/// Pick the candidate with the lowest cloud cover
///
/// Ties on cloud cover go to the earliest acquisition; exact ties on both go
/// to whichever the provider returned first. Candidates whose cloud cover is
/// not a number are never selected.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .filter(|c| !c.cloud_cover.is_nan())
        .fold(None, |best: Option<&Candidate>, candidate| match best {
            Some(current) if compare(candidate, current) != Ordering::Less => Some(current),
            _ => Some(candidate),
        })
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    a.cloud_cover
        .partial_cmp(&b.cloud_cover)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.acquired.cmp(&b.acquired))
}
