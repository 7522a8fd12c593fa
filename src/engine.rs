//! Auto-match orchestration
//!
//! Wires the ranker, result cache, variant assignment, join attempts,
//! and outcome logging into the single entry point the app calls when
//! a learner opens the pods screen.

use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::experiment::{assign_variant, OutcomeSink, VariantStore};
use crate::matching::{rank, MatchCache};
use crate::model::{ExperimentOutcome, MatchResult, Variant};
use crate::store::{PodFilter, PodStore, ProfileStore};

/// Result of one auto-match invocation.
///
/// `joined` holds only the pods whose join call succeeded; callers
/// wanting the failed subset can diff it against `join_targets`.
#[derive(Debug, Clone)]
pub struct AutoMatchOutcome {
    pub variant: Variant,
    pub recommended: Vec<MatchResult>,
    /// Recommended pods the user was not already a member of, capped
    /// at the join limit. Under the prompted variant these are
    /// surfaced for manual confirmation instead of being joined.
    pub join_targets: Vec<String>,
    pub joined: Vec<String>,
}

/// The recommendation and auto-match engine
pub struct MatchEngine {
    profiles: Arc<dyn ProfileStore>,
    pods: Arc<dyn PodStore>,
    variants: Arc<dyn VariantStore>,
    outcomes: Arc<dyn OutcomeSink>,
    cache: MatchCache,
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        pods: Arc<dyn PodStore>,
        variants: Arc<dyn VariantStore>,
        outcomes: Arc<dyn OutcomeSink>,
        config: MatchConfig,
    ) -> Self {
        let cache = MatchCache::new(chrono::Duration::minutes(config.cache_ttl_minutes as i64));
        Self {
            profiles,
            pods,
            variants,
            outcomes,
            cache,
            config,
        }
    }

    /// Rank the public, active pods for a user, consulting the result
    /// cache first.
    ///
    /// An absent profile is valid (no matching signal, dynamism-only
    /// scores); a store failure fails the whole request so the caller
    /// can show "no recommendations available right now".
    pub async fn recommend(&self, user_id: &str, limit: usize) -> Result<Vec<MatchResult>> {
        self.cache
            .get_or_compute(user_id, limit, || async {
                let profile = self.profiles.get_profile(user_id).await?.unwrap_or_default();
                let candidates = self.pods.list_pods(&PodFilter::candidates()).await?;
                debug!(
                    "Scoring {} candidate pods for user {}",
                    candidates.len(),
                    user_id
                );
                Ok(rank(&profile, &candidates, limit, Utc::now()))
            })
            .await
    }

    /// Run the full auto-match flow with the configured default limits
    pub async fn auto_match(&self, user_id: &str) -> Result<AutoMatchOutcome> {
        self.auto_match_and_join(user_id, self.config.match_limit, self.config.join_limit, None)
            .await
    }

    /// Recommend pods and, under the auto-join variant, enroll the
    /// user into the top unjoined matches.
    ///
    /// A failed join on one target is logged and does not abort the
    /// remaining attempts; partial success is expected. The outcome
    /// record write is best-effort and never affects the return value.
    pub async fn auto_match_and_join(
        &self,
        user_id: &str,
        match_limit: usize,
        join_limit: usize,
        variant_override: Option<Variant>,
    ) -> Result<AutoMatchOutcome> {
        let variant = match variant_override {
            Some(v) => v,
            None => assign_variant(self.variants.as_ref(), user_id)?,
        };

        let recommended = self.recommend(user_id, match_limit).await?;

        let member_ids: HashSet<String> = self
            .pods
            .list_user_pods(user_id)
            .await?
            .into_iter()
            .map(|pod| pod.id)
            .collect();

        let join_targets: Vec<String> = recommended
            .iter()
            .map(|r| r.pod.id.clone())
            .filter(|id| !member_ids.contains(id))
            .take(join_limit)
            .collect();

        let mut joined = Vec::new();
        if variant == Variant::AutoJoin {
            for pod_id in &join_targets {
                match self.pods.join_pod(pod_id, user_id).await {
                    Ok(()) => {
                        info!("Auto-joined user {} into pod {}", user_id, pod_id);
                        joined.push(pod_id.clone());
                    }
                    Err(e) => {
                        warn!("Failed to join user {} into pod {}: {:#}", user_id, pod_id, e);
                    }
                }
            }
        }

        let outcome = ExperimentOutcome {
            user_id: user_id.to_string(),
            variant,
            recommended_pod_ids: recommended.iter().map(|r| r.pod.id.clone()).collect(),
            joined_pod_ids: joined.clone(),
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.outcomes.record_outcome(&outcome).await {
            warn!("Failed to record experiment outcome for user {}: {:#}", user_id, e);
        }

        info!(
            "Auto-match complete for user {}: variant {}, {} recommended, {} joined",
            user_id,
            variant.as_str(),
            recommended.len(),
            joined.len()
        );

        Ok(AutoMatchOutcome {
            variant,
            recommended,
            join_targets,
            joined,
        })
    }
}
