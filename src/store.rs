//! Boundary traits for the external profile and pod stores
//!
//! The hosted backend owns profiles, pods, and memberships; this crate
//! only reads them and issues join requests. Failures carry no retry
//! semantics here: within one orchestration pass every failure is
//! treated as non-retryable.

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Pod, Profile};

/// Candidate filter for pod listings
#[derive(Debug, Clone, Default)]
pub struct PodFilter {
    pub is_public: Option<bool>,
    pub is_active: Option<bool>,
}

impl PodFilter {
    /// The matching candidate set: public, active pods
    pub fn candidates() -> Self {
        Self {
            is_public: Some(true),
            is_active: Some(true),
        }
    }

    pub fn matches(&self, pod: &Pod) -> bool {
        self.is_public.map_or(true, |v| pod.is_public == v)
            && self.is_active.map_or(true, |v| pod.is_active == v)
    }
}

/// Read access to learner profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile; `None` means the user has not filled one in,
    /// which is valid (no matching signal), not an error.
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>>;
}

/// Read and join access to pods
#[async_trait]
pub trait PodStore: Send + Sync {
    async fn list_pods(&self, filter: &PodFilter) -> Result<Vec<Pod>>;

    /// Pods the user is already a member of
    async fn list_user_pods(&self, user_id: &str) -> Result<Vec<Pod>>;

    /// Enroll the user into a pod. Idempotent on the backend side;
    /// re-joining an already-joined pod is harmless.
    async fn join_pod(&self, pod_id: &str, user_id: &str) -> Result<()>;
}
