mod criteria;
mod exclusions;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{PropertySnapshot, RentalApplication};
use super::preferences::{Criterion, ModelType, ScoringPreferenceProfile};
use criteria::{CriterionOutcome, ScoreSignals};
use exclusions::{advice, matched_exclusions};

/// Score reported when no rubric could be loaded.
pub const NEUTRAL_SCORE: u8 = 50;

/// Computes a compatibility result from a rubric and the two input snapshots.
///
/// Implementations must be pure: the same inputs always yield the same result.
pub trait ScoreCalculator: Send + Sync {
    fn score(
        &self,
        application: &RentalApplication,
        property: &PropertySnapshot,
        preferences: &ScoringPreferenceProfile,
    ) -> ScoreResult;
}

/// Default rubric evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubricCalculator;

impl ScoreCalculator for RubricCalculator {
    fn score(
        &self,
        application: &RentalApplication,
        property: &PropertySnapshot,
        preferences: &ScoringPreferenceProfile,
    ) -> ScoreResult {
        let config = &preferences.criteria;
        let signals = ScoreSignals::collect(application, property, preferences);

        let outcomes: Vec<CriterionOutcome> = Criterion::ALL
            .into_iter()
            .filter(|criterion| config.weight(*criterion) > 0.0)
            .map(|criterion| match criterion {
                Criterion::IncomeRatio => {
                    criteria::score_income_ratio(&config.income_ratio, &signals)
                }
                Criterion::ProfessionalStability => {
                    criteria::score_stability(&config.professional_stability, application)
                }
                Criterion::Guarantor => criteria::score_guarantor(
                    &config.guarantor,
                    application,
                    property,
                    &signals,
                ),
                Criterion::FileQuality => {
                    criteria::score_file_quality(&config.file_quality, application, &signals)
                }
                Criterion::PropertyCoherence => criteria::score_property_coherence(
                    &config.property_coherence,
                    property,
                    &signals,
                ),
                Criterion::IncomeDistribution => {
                    criteria::score_income_distribution(&config.income_distribution, application)
                }
            })
            .collect();

        let raw_total: f64 = outcomes.iter().map(|outcome| outcome.score).sum();
        let total_score = round_total(raw_total);

        let exclusions = matched_exclusions(preferences, &signals);
        let (recommendations, warnings) = advice(&outcomes);
        let compatible = exclusions.is_empty() && total_score >= preferences.minimum_score;

        let breakdown = outcomes
            .into_iter()
            .map(|outcome| {
                (
                    outcome.criterion,
                    CriterionScore {
                        score: outcome.score,
                        max: outcome.max,
                        details: outcome.details,
                    },
                )
            })
            .collect();

        ScoreResult {
            total_score,
            breakdown,
            recommendations,
            warnings,
            exclusions,
            compatible,
            model_used: preferences.model_type,
            computed_at_version: preferences.version,
            degraded: false,
        }
    }
}

/// Clamp to [0, 100] and round half-up.
pub fn round_total(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}

/// Points awarded for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: f64,
    pub max: f64,
    pub details: String,
}

/// Immutable outcome of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: u8,
    pub breakdown: BTreeMap<Criterion, CriterionScore>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub exclusions: Vec<String>,
    pub compatible: bool,
    pub model_used: ModelType,
    pub computed_at_version: u64,
    /// Set when no rubric could be loaded and the neutral score was returned.
    #[serde(default)]
    pub degraded: bool,
}

impl ScoreResult {
    /// Neutral, incompatible result returned when the owner's rubric is unavailable.
    pub fn degraded(reason: impl std::fmt::Display) -> Self {
        Self {
            total_score: NEUTRAL_SCORE,
            breakdown: BTreeMap::new(),
            recommendations: Vec::new(),
            warnings: vec![format!("Scoring preferences unavailable: {reason}")],
            exclusions: Vec::new(),
            compatible: false,
            model_used: ModelType::Standard,
            computed_at_version: 0,
            degraded: true,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}
