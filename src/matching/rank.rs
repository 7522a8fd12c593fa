//! Ranking candidate pods for a profile

use chrono::{DateTime, Utc};

use super::score::score;
use crate::model::{MatchResult, Pod, Profile};

/// Score every candidate and return the top `limit` by descending
/// score. Pure: repeated calls with identical input produce an
/// identical sequence.
///
/// Ties keep the relative order of the input slice (stable sort), so
/// recommendations are reproducible across calls.
pub fn rank(profile: &Profile, pods: &[Pod], limit: usize, now: DateTime<Utc>) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = pods
        .iter()
        .map(|pod| MatchResult {
            pod: pod.clone(),
            score: score(profile, pod, now),
        })
        .collect();

    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(limit);
    results
}
