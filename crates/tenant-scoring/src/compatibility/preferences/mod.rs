mod presets;
mod store;

pub use store::{PreferenceError, PreferenceStore, PreferenceUpdate};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ContractType, GuarantorKind, OwnerId};

/// Rubric families an owner can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Strict,
    Standard,
    Flexible,
    Custom,
}

impl ModelType {
    pub const fn label(self) -> &'static str {
        match self {
            ModelType::Strict => "strict",
            ModelType::Standard => "standard",
            ModelType::Flexible => "flexible",
            ModelType::Custom => "custom",
        }
    }
}

/// Named dimensions of the rubric, in scoring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    IncomeRatio,
    ProfessionalStability,
    Guarantor,
    FileQuality,
    PropertyCoherence,
    IncomeDistribution,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::IncomeRatio,
        Criterion::ProfessionalStability,
        Criterion::Guarantor,
        Criterion::FileQuality,
        Criterion::PropertyCoherence,
        Criterion::IncomeDistribution,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Criterion::IncomeRatio => "income ratio",
            Criterion::ProfessionalStability => "professional stability",
            Criterion::Guarantor => "guarantor",
            Criterion::FileQuality => "file quality",
            Criterion::PropertyCoherence => "property coherence",
            Criterion::IncomeDistribution => "income distribution",
        }
    }
}

/// Hard veto conditions that override the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionRule {
    IncompleteFile,
    NoGuarantorWhenRequired,
    InsufficientIncomeRatio,
    UnverifiedDocuments,
    HouseholdIncoherence,
}

/// Owner-defined rubric. Stored and shared as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPreferenceProfile {
    pub id: String,
    pub owner_id: OwnerId,
    pub name: String,
    pub model_type: ModelType,
    #[serde(default)]
    pub version: u64,
    pub minimum_score: u8,
    pub criteria: CriteriaConfig,
    #[serde(default)]
    pub exclusion_rules: BTreeMap<ExclusionRule, bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoringPreferenceProfile {
    pub fn rule_enabled(&self, rule: ExclusionRule) -> bool {
        self.exclusion_rules.get(&rule).copied().unwrap_or(false)
    }

    pub fn total_weight(&self) -> f64 {
        Criterion::ALL
            .iter()
            .map(|criterion| self.criteria.weight(*criterion))
            .sum()
    }
}

/// Per-criterion configuration. A criterion whose weight is zero is not scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaConfig {
    pub income_ratio: IncomeRatioConfig,
    pub professional_stability: StabilityConfig,
    pub guarantor: GuarantorConfig,
    pub file_quality: FileQualityConfig,
    pub property_coherence: PropertyCoherenceConfig,
    pub income_distribution: IncomeDistributionConfig,
}

impl CriteriaConfig {
    pub fn weight(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::IncomeRatio => self.income_ratio.weight,
            Criterion::ProfessionalStability => self.professional_stability.weight,
            Criterion::Guarantor => self.guarantor.weight,
            Criterion::FileQuality => self.file_quality.weight,
            Criterion::PropertyCoherence => self.property_coherence.weight,
            Criterion::IncomeDistribution => self.income_distribution.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRatioConfig {
    pub weight: f64,
    pub thresholds: IncomeThresholds,
    /// Ratio under which the `insufficient_income_ratio` exclusion applies.
    pub absolute_floor: f64,
}

/// Ordered income-to-rent thresholds: excellent >= good >= acceptable >= minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeThresholds {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    pub minimum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    pub weight: f64,
    /// Absolute points per contract type, capped at the weight.
    pub contract_points: BTreeMap<ContractType, f64>,
    pub seniority_bonus: SeniorityBonus,
    pub trial_period_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeniorityBonus {
    pub enabled: bool,
    pub minimum_months: u32,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuarantorConfig {
    pub weight: f64,
    /// Applicant ratio under which a guarantor becomes mandatory.
    pub required_if_income_below: f64,
    /// Guarantor income / rent ratio required when the guarantor is mandatory.
    pub minimum_income_ratio: f64,
    pub accepted_types: Vec<GuarantorKind>,
    /// Fraction awarded for a guarantor that is present but unaccepted or insufficient.
    pub partial_credit: f64,
    /// Fraction awarded when no guarantor is provided and none is required.
    pub unrequired_credit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileQualityConfig {
    pub weight: f64,
    pub completeness_share: f64,
    pub verification_share: f64,
    pub presentation_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCoherenceConfig {
    pub weight: f64,
    pub occupancy_share: f64,
    pub space_share: f64,
    pub min_surface_per_occupant: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeDistributionConfig {
    pub weight: f64,
    pub balance_share: f64,
    pub consistency_share: f64,
    /// Smallest/largest earner income ratio treated as fully balanced.
    pub balanced_ratio: f64,
    /// Allowed relative gap between declared income and the sum of earner incomes.
    pub tolerance: f64,
}
