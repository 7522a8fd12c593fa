//! podmatch - Pod Recommendation & Auto-Match Engine
//!
//! Scores and ranks candidate study groups ("pods") for a learner
//! profile, optionally auto-enrolls the learner into top matches under
//! an A/B experiment, and records the outcome for offline evaluation.
//!
//! The crate is an internal library: the surrounding app supplies the
//! profile/pod stores and calls [`engine::MatchEngine`]. The bundled
//! `podmatch` binary is a local inspection tool only.

pub mod config;
pub mod engine;
pub mod experiment;
pub mod matching;
pub mod model;
pub mod store;

pub use config::MatchConfig;
pub use engine::{AutoMatchOutcome, MatchEngine};
pub use model::{ExperimentOutcome, MatchResult, Pod, Profile, Variant};
