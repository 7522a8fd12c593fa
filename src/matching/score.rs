//! Fit scoring between a learner profile and a candidate pod
//!
//! Five weighted sub-scores plus a gap penalty and a dynamism bonus,
//! composed into an integer score in [0, 100]. Missing data never
//! errors; it degrades to neutral or low sub-scores.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use super::normalize::normalize;
use crate::model::{Pod, Profile};

// Base fit weights
const W_INTERESTS: f64 = 0.35;
const W_GOALS: f64 = 0.25;
const W_PACE: f64 = 0.12;
const W_SESSION_TYPE: f64 = 0.10;
const W_AVAILABILITY: f64 = 0.08;

// Dynamism bonus weights
const W_RECENCY: f64 = 0.05;
const W_ACTIVITY: f64 = 0.08;

// Fixed discount on uncovered interests
const GAP_COEFFICIENT: f64 = 0.5;

// Activity saturates at this many sessions
const ACTIVITY_SATURATION: f64 = 25.0;

/// Pace score when pace and difficulty are both present but unmatched
const PACE_MISMATCH: f64 = 0.4;
/// Pace score when either signal is absent
const PACE_UNKNOWN: f64 = 0.3;

/// Compute the fit score between one profile and one pod.
///
/// `now` anchors the recency sub-score; pass `Utc::now()` outside of
/// tests. Pure: no shared state, safe to call from anywhere.
pub fn score(profile: &Profile, pod: &Pod, now: DateTime<Utc>) -> u8 {
    let interests = normalize(&profile.interests);
    let tags = topic_tokens(pod);

    let interests_score = overlap(&interests, &tags);
    let goals_score = overlap(
        &normalize(&profile.learning_goals),
        &normalize(&pod.ideal_learner_type),
    );
    let pace_score = pace_score(
        &normalize(&profile.learning_pace),
        &normalize(&pod.difficulty),
    );
    let session_type_score = overlap(
        &normalize(&profile.preferred_session_types),
        &normalize(&pod.session_type),
    );
    let availability_score = overlap(
        &normalize(&profile.availability),
        &normalize(&pod.common_availability),
    );

    let base_fit = W_INTERESTS * interests_score
        + W_GOALS * goals_score
        + W_PACE * pace_score
        + W_SESSION_TYPE * session_type_score
        + W_AVAILABILITY * availability_score;

    let dynamism = W_RECENCY * recency_score(pod, now)
        + W_ACTIVITY * activity_score(pod);

    let gap_adjust = (1.0 - GAP_COEFFICIENT * gap_score(&interests, &tags)).max(0.0);

    let raw = (100.0 * (base_fit * gap_adjust + dynamism)).round();
    raw.clamp(0.0, 100.0) as u8
}

/// Topic tokens for a pod: first non-empty of matching_tags, tags,
/// subject.
pub fn topic_tokens(pod: &Pod) -> BTreeSet<String> {
    for source in [&pod.matching_tags, &pod.tags, &pod.subject] {
        let tokens = normalize(source);
        if !tokens.is_empty() {
            return tokens;
        }
    }
    BTreeSet::new()
}

/// Jaccard-like overlap: |A∩B| / max(|A|,|B|), 0 when either is empty.
fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    shared as f64 / a.len().max(b.len()) as f64
}

/// Fraction of the learner's interests the pod does not cover,
/// 0 when either set is empty.
fn gap_score(interests: &BTreeSet<String>, tags: &BTreeSet<String>) -> f64 {
    if interests.is_empty() || tags.is_empty() {
        return 0.0;
    }
    let uncovered = interests.difference(tags).count();
    uncovered as f64 / interests.len() as f64
}

/// Pace vs. difficulty rule table. Pace is free text, so containment
/// is substring-tolerant ("fast-paced" counts as fast).
fn pace_score(pace: &BTreeSet<String>, difficulty: &BTreeSet<String>) -> f64 {
    if pace.is_empty() || difficulty.is_empty() {
        return PACE_UNKNOWN;
    }

    let pace_has = |needle: &str| pace.iter().any(|t| t.contains(needle));
    let matched = (pace_has("fast") && difficulty.contains("advanced"))
        || (pace_has("moderate") && difficulty.contains("intermediate"))
        || (pace_has("slow") && difficulty.contains("beginner"));

    if matched {
        1.0
    } else {
        PACE_MISMATCH
    }
}

/// Tiered freshness from updated_at, falling back to created_at.
/// Missing or unparseable timestamps land in the coldest tier.
fn recency_score(pod: &Pod, now: DateTime<Utc>) -> f64 {
    let stamp = pod
        .updated_at
        .as_deref()
        .or(pod.created_at.as_deref())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let Some(stamp) = stamp else {
        return 0.4;
    };

    let age_days = (now - stamp).num_days();
    if age_days < 1 {
        1.0
    } else if age_days < 7 {
        0.8
    } else if age_days < 30 {
        0.6
    } else {
        0.4
    }
}

fn activity_score(pod: &Pod) -> f64 {
    (pod.activity_signal() as f64 / ACTIVITY_SATURATION).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PodStats;
    use chrono::Duration;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    fn stale_pod() -> Pod {
        // No timestamps, no activity: recency 0.4, activity 0
        Pod { id: "pod".into(), ..Pod::default() }
    }

    #[test]
    fn test_overlap_definition() {
        let a: BTreeSet<String> = ["calculus", "algebra"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["calculus"].iter().map(|s| s.to_string()).collect();
        assert_eq!(overlap(&a, &b), 0.5);
        assert_eq!(overlap(&a, &BTreeSet::new()), 0.0);
        assert_eq!(overlap(&BTreeSet::new(), &b), 0.0);
    }

    #[test]
    fn test_empty_profile_scores_dynamism_only() {
        // All profile signals absent: pace 0.3 is the only base term,
        // so base_fit = 0.12 * 0.3 = 0.036 with gap_adjust 1. A stale,
        // inactive pod adds dynamism 0.05 * 0.4 = 0.02.
        // round(100 * 0.056) = 6
        let profile = Profile::default();
        let s = score(&profile, &stale_pod(), now());
        assert_eq!(s, 6);
    }

    #[test]
    fn test_maximum_is_exactly_100() {
        let profile = Profile {
            interests: json!(["calculus"]),
            learning_goals: json!(["mastery"]),
            learning_pace: json!("fast"),
            preferred_session_types: json!(["quiz"]),
            availability: json!(["monday"]),
        };
        let pod = Pod {
            id: "perfect".into(),
            tags: json!(["calculus"]),
            ideal_learner_type: json!(["mastery"]),
            difficulty: json!("Advanced"),
            session_type: json!(["quiz"]),
            common_availability: json!(["monday"]),
            updated_at: Some(now().to_rfc3339()),
            stats: Some(PodStats { total_sessions: Some(50) }),
            ..Pod::default()
        };
        assert_eq!(score(&profile, &pod, now()), 100);
    }

    #[test]
    fn test_score_bounds() {
        let profiles = vec![
            Profile::default(),
            Profile { interests: json!(["a", "b", "c"]), ..Profile::default() },
            Profile {
                interests: json!("[\"x\"]"),
                learning_pace: json!("slow"),
                ..Profile::default()
            },
        ];
        let pods = vec![
            stale_pod(),
            Pod { tags: json!(["z"]), difficulty: json!("Beginner"), ..stale_pod() },
            Pod {
                matching_tags: json!(["a", "x"]),
                updated_at: Some(now().to_rfc3339()),
                member_count: Some(100),
                ..stale_pod()
            },
        ];
        for profile in &profiles {
            for pod in &pods {
                let s = score(profile, pod, now());
                assert!(s <= 100, "score {} out of bounds", s);
            }
        }
    }

    #[test]
    fn test_pace_rule_table() {
        let fast: BTreeSet<String> = ["fast-paced".to_string()].into_iter().collect();
        let advanced: BTreeSet<String> = ["advanced".to_string()].into_iter().collect();
        let beginner: BTreeSet<String> = ["beginner".to_string()].into_iter().collect();

        assert_eq!(pace_score(&fast, &advanced), 1.0);
        assert_eq!(pace_score(&fast, &beginner), PACE_MISMATCH);
        assert_eq!(pace_score(&BTreeSet::new(), &advanced), PACE_UNKNOWN);
        assert_eq!(pace_score(&fast, &BTreeSet::new()), PACE_UNKNOWN);
    }

    #[test]
    fn test_recency_tiers() {
        let mut pod = stale_pod();
        assert_eq!(recency_score(&pod, now()), 0.4);

        pod.updated_at = Some((now() - Duration::hours(3)).to_rfc3339());
        assert_eq!(recency_score(&pod, now()), 1.0);

        pod.updated_at = Some((now() - Duration::days(3)).to_rfc3339());
        assert_eq!(recency_score(&pod, now()), 0.8);

        pod.updated_at = Some((now() - Duration::days(20)).to_rfc3339());
        assert_eq!(recency_score(&pod, now()), 0.6);

        pod.updated_at = Some((now() - Duration::days(90)).to_rfc3339());
        assert_eq!(recency_score(&pod, now()), 0.4);

        // updated_at wins the source slot even when unparseable,
        // and a failed parse lands in the coldest tier
        pod.updated_at = Some("not a timestamp".into());
        pod.created_at = Some((now() - Duration::hours(1)).to_rfc3339());
        assert_eq!(recency_score(&pod, now()), 0.4);
    }

    #[test]
    fn test_activity_saturates() {
        let mut pod = stale_pod();
        pod.member_count = Some(10);
        assert_eq!(activity_score(&pod), 0.4);
        pod.member_count = Some(25);
        assert_eq!(activity_score(&pod), 1.0);
        pod.member_count = Some(250);
        assert_eq!(activity_score(&pod), 1.0);
    }

    #[test]
    fn test_topic_tokens_first_nonempty_source_wins() {
        let pod = Pod {
            matching_tags: json!([]),
            tags: json!(["Algebra"]),
            subject: json!("calculus"),
            ..Pod::default()
        };
        let tokens: Vec<String> = topic_tokens(&pod).into_iter().collect();
        assert_eq!(tokens, vec!["algebra"]);
    }

    #[test]
    fn test_relevant_pod_outscores_unrelated_pod() {
        let profile = Profile {
            interests: json!(["calculus", "algebra"]),
            learning_pace: json!("fast"),
            ..Profile::default()
        };
        let pod_a = Pod {
            id: "a".into(),
            tags: json!(["calculus"]),
            difficulty: json!("Advanced"),
            ..Pod::default()
        };
        let pod_b = Pod {
            id: "b".into(),
            tags: json!(["poetry"]),
            difficulty: json!("Beginner"),
            ..Pod::default()
        };

        let sa = score(&profile, &pod_a, now());
        let sb = score(&profile, &pod_b, now());
        assert!(sa > sb, "relevant pod should outscore: {} vs {}", sa, sb);
    }
}
