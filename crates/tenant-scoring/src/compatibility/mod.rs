//! Applicant–property compatibility scoring.
//!
//! Owners maintain a versioned rubric; score requests are answered from a cache that is
//! validated against the rubric version and the exact inputs, and cache misses are
//! coalesced per application before the pure calculator runs.

pub mod cache;
pub mod calculator;
pub mod clock;
pub mod debounce;
pub mod domain;
pub mod engine;
pub mod events;
pub mod preferences;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use cache::{CacheEntry, CacheKey, CacheStats, ScoreCache};
pub use calculator::{CriterionScore, RubricCalculator, ScoreCalculator, ScoreResult, NEUTRAL_SCORE};
pub use clock::{Clock, ManualClock, SystemClock};
pub use debounce::{DebounceError, DebounceScheduler};
pub use domain::{
    ApplicationId, ContractType, DocumentChecklist, Guarantor, GuarantorKind, Household, OwnerId,
    PropertyId, PropertySnapshot, RentalApplication, VerificationStatus,
};
pub use engine::{ScoreRequest, ScoringEngine, ScoringError};
pub use events::{EventBus, EventType, ScoringEvent, Subscription};
pub use preferences::{
    CriteriaConfig, Criterion, ExclusionRule, ModelType, PreferenceError, PreferenceStore,
    PreferenceUpdate, ScoringPreferenceProfile,
};
pub use repository::{ApplicationProvider, PreferenceRepository, PropertyProvider, RepositoryError};
pub use router::scoring_router;
pub use service::{CompatibilityService, ScoringServiceError};
