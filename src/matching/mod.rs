//! Matching module for podmatch
//!
//! Turns loosely-typed profile/pod attributes into canonical token
//! sets, scores profile/pod fit, ranks candidates, and memoizes
//! ranked results behind a TTL cache.

pub mod cache;
pub mod normalize;
pub mod rank;
pub mod score;

pub use cache::MatchCache;
pub use normalize::normalize;
pub use rank::rank;
pub use score::score;
