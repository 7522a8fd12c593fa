//! Core data types for pod matching
//!
//! Profiles and pods come from the hosted document store, which is
//! loosely typed: any matching field may arrive as a scalar, a list,
//! or a JSON-serialized list embedded in a string. Those fields are
//! kept as raw `serde_json::Value`s here and converted to token sets
//! at the normalization boundary in `matching::normalize`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A learner profile as stored by the backend.
///
/// Every field is optional; an absent field means "no signal" for
/// matching, never an error. `Value::Null` is the absent state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub interests: Value,
    pub learning_goals: Value,
    /// Free-text tolerant: "fast", "Fast-paced", "moderate", etc.
    pub learning_pace: Value,
    pub preferred_session_types: Value,
    pub availability: Value,
}

/// Session statistics attached to a pod record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodStats {
    pub total_sessions: Option<u32>,
}

/// A candidate study group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pod {
    pub id: String,
    pub name: Option<String>,
    /// Topic tokens: first non-empty of matching_tags, tags, subject wins.
    pub matching_tags: Value,
    pub tags: Value,
    pub subject: Value,
    pub ideal_learner_type: Value,
    /// One of Beginner / Intermediate / Advanced, free-text tolerant.
    pub difficulty: Value,
    pub session_type: Value,
    pub common_availability: Value,
    /// RFC 3339 timestamps; updated_at preferred over created_at.
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub stats: Option<PodStats>,
    pub member_count: Option<u32>,
    pub is_public: bool,
    pub is_active: bool,
}

impl Pod {
    /// Activity signal for scoring: session count if tracked,
    /// member count as fallback, zero when neither is present.
    pub fn activity_signal(&self) -> u32 {
        self.stats
            .as_ref()
            .and_then(|s| s.total_sessions)
            .or(self.member_count)
            .unwrap_or(0)
    }
}

/// An immutable (pod, fit score) pair produced by the ranker.
///
/// Scores are integers in [0, 100]. Within one ranking call results
/// are sorted by score descending with stable ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub pod: Pod,
    pub score: u8,
}

/// Arm of the auto-join vs. prompted A/B experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Top matches are joined automatically on the learner's behalf.
    AutoJoin,
    /// Matches are surfaced for manual confirmation instead.
    Prompted,
}

impl Variant {
    /// String form used for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::AutoJoin => "auto-join",
            Variant::Prompted => "prompted",
        }
    }

    /// Parse from the database string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto-join" => Some(Variant::AutoJoin),
            "prompted" => Some(Variant::Prompted),
            _ => None,
        }
    }
}

/// Write-once audit record of one auto-match invocation.
///
/// Recording is best-effort: a failed write is logged and never
/// surfaced to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    pub user_id: String,
    pub variant: Variant,
    pub recommended_pod_ids: Vec<String>,
    pub joined_pod_ids: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}
