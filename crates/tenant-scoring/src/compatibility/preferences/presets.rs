use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{
    CriteriaConfig, ExclusionRule, FileQualityConfig, GuarantorConfig, IncomeDistributionConfig,
    IncomeRatioConfig, IncomeThresholds, ModelType, PropertyCoherenceConfig, ScoringPreferenceProfile,
    SeniorityBonus, StabilityConfig,
};
use crate::compatibility::domain::{ContractType, GuarantorKind, OwnerId};

const ALL_GUARANTORS: [GuarantorKind; 4] = [
    GuarantorKind::Individual,
    GuarantorKind::PublicScheme,
    GuarantorKind::Company,
    GuarantorKind::BankDeposit,
];

/// Weights in rubric order; each set sums to 100.
struct Weights {
    income_ratio: f64,
    stability: f64,
    guarantor: f64,
    file_quality: f64,
    coherence: f64,
    distribution: f64,
}

impl ScoringPreferenceProfile {
    /// Build the default rubric for a model type at version 0.
    pub fn preset(owner_id: OwnerId, model_type: ModelType, now: DateTime<Utc>) -> Self {
        let (criteria, minimum_score, rules) = match model_type {
            ModelType::Strict => (strict_criteria(), 65, strict_rules()),
            ModelType::Standard | ModelType::Custom => (standard_criteria(), 50, standard_rules()),
            ModelType::Flexible => (flexible_criteria(), 40, flexible_rules()),
        };

        Self {
            id: format!("{}-{}", owner_id.0, model_type.label()),
            name: format!("{} rubric", model_type.label()),
            owner_id,
            model_type,
            version: 0,
            minimum_score,
            criteria,
            exclusion_rules: rules.into_iter().collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

fn standard_criteria() -> CriteriaConfig {
    build_criteria(
        Weights {
            income_ratio: 18.0,
            stability: 25.0,
            guarantor: 20.0,
            file_quality: 15.0,
            coherence: 10.0,
            distribution: 12.0,
        },
        IncomeThresholds {
            excellent: 3.5,
            good: 3.0,
            acceptable: 2.5,
            minimum: 2.0,
        },
        1.5,
        GuarantorConfig {
            weight: 20.0,
            required_if_income_below: 3.0,
            minimum_income_ratio: 3.0,
            accepted_types: ALL_GUARANTORS.to_vec(),
            partial_credit: 0.5,
            unrequired_credit: 1.0,
        },
        12,
    )
}

fn strict_criteria() -> CriteriaConfig {
    build_criteria(
        Weights {
            income_ratio: 25.0,
            stability: 25.0,
            guarantor: 20.0,
            file_quality: 15.0,
            coherence: 8.0,
            distribution: 7.0,
        },
        IncomeThresholds {
            excellent: 4.0,
            good: 3.5,
            acceptable: 3.0,
            minimum: 2.5,
        },
        2.5,
        GuarantorConfig {
            weight: 20.0,
            required_if_income_below: 3.5,
            minimum_income_ratio: 3.5,
            accepted_types: vec![
                GuarantorKind::Individual,
                GuarantorKind::PublicScheme,
                GuarantorKind::BankDeposit,
            ],
            partial_credit: 0.25,
            unrequired_credit: 0.75,
        },
        24,
    )
}

fn flexible_criteria() -> CriteriaConfig {
    build_criteria(
        Weights {
            income_ratio: 15.0,
            stability: 20.0,
            guarantor: 15.0,
            file_quality: 20.0,
            coherence: 15.0,
            distribution: 15.0,
        },
        IncomeThresholds {
            excellent: 3.0,
            good: 2.5,
            acceptable: 2.0,
            minimum: 1.5,
        },
        1.2,
        GuarantorConfig {
            weight: 15.0,
            required_if_income_below: 2.5,
            minimum_income_ratio: 2.5,
            accepted_types: ALL_GUARANTORS.to_vec(),
            partial_credit: 0.6,
            unrequired_credit: 1.0,
        },
        6,
    )
}

fn build_criteria(
    weights: Weights,
    thresholds: IncomeThresholds,
    absolute_floor: f64,
    guarantor: GuarantorConfig,
    seniority_months: u32,
) -> CriteriaConfig {
    let stability = weights.stability;
    let contract_points = [
        (ContractType::PermanentConfirmed, 1.0),
        (ContractType::CivilServant, 1.0),
        (ContractType::Retired, 0.9),
        (ContractType::PermanentTrial, 0.7),
        (ContractType::FixedTermLong, 0.6),
        (ContractType::Freelance, 0.5),
        (ContractType::FixedTermShort, 0.4),
        (ContractType::Student, 0.3),
        (ContractType::Unemployed, 0.0),
    ]
    .into_iter()
    .map(|(contract, fraction)| (contract, fraction * stability))
    .collect::<BTreeMap<_, _>>();

    CriteriaConfig {
        income_ratio: IncomeRatioConfig {
            weight: weights.income_ratio,
            thresholds,
            absolute_floor,
        },
        professional_stability: StabilityConfig {
            weight: stability,
            contract_points,
            seniority_bonus: SeniorityBonus {
                enabled: true,
                minimum_months: seniority_months,
                points: 0.12 * stability,
            },
            trial_period_penalty: 0.2 * stability,
        },
        guarantor: GuarantorConfig {
            weight: weights.guarantor,
            ..guarantor
        },
        file_quality: FileQualityConfig {
            weight: weights.file_quality,
            completeness_share: 0.5,
            verification_share: 0.3,
            presentation_share: 0.2,
        },
        property_coherence: PropertyCoherenceConfig {
            weight: weights.coherence,
            occupancy_share: 0.6,
            space_share: 0.4,
            min_surface_per_occupant: 9.0,
        },
        income_distribution: IncomeDistributionConfig {
            weight: weights.distribution,
            balance_share: 0.6,
            consistency_share: 0.4,
            balanced_ratio: 0.5,
            tolerance: 0.1,
        },
    }
}

fn strict_rules() -> Vec<(ExclusionRule, bool)> {
    vec![
        (ExclusionRule::IncompleteFile, true),
        (ExclusionRule::NoGuarantorWhenRequired, true),
        (ExclusionRule::InsufficientIncomeRatio, true),
        (ExclusionRule::UnverifiedDocuments, true),
        (ExclusionRule::HouseholdIncoherence, true),
    ]
}

fn standard_rules() -> Vec<(ExclusionRule, bool)> {
    vec![
        (ExclusionRule::IncompleteFile, true),
        (ExclusionRule::NoGuarantorWhenRequired, true),
        (ExclusionRule::InsufficientIncomeRatio, true),
        (ExclusionRule::UnverifiedDocuments, false),
        (ExclusionRule::HouseholdIncoherence, true),
    ]
}

fn flexible_rules() -> Vec<(ExclusionRule, bool)> {
    vec![
        (ExclusionRule::IncompleteFile, false),
        (ExclusionRule::NoGuarantorWhenRequired, true),
        (ExclusionRule::InsufficientIncomeRatio, true),
        (ExclusionRule::UnverifiedDocuments, false),
        (ExclusionRule::HouseholdIncoherence, true),
    ]
}
