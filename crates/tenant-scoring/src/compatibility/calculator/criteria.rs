use crate::compatibility::domain::{
    DocumentChecklist, GuarantorKind, PropertySnapshot, RentalApplication, VerificationStatus,
};
use crate::compatibility::preferences::{
    Criterion, FileQualityConfig, GuarantorConfig, IncomeDistributionConfig, IncomeRatioConfig,
    PropertyCoherenceConfig, ScoringPreferenceProfile, StabilityConfig,
};

/// Points awarded below the minimum income threshold; never zero.
pub(crate) const INCOME_FLOOR_FRACTION: f64 = 0.2;

/// Facts derived once from the inputs and shared by scoring and exclusion rules.
pub(crate) struct ScoreSignals {
    pub income_ratio: Option<f64>,
    pub guarantor_required: bool,
    pub has_guarantor: bool,
    pub documents_present: usize,
    pub verification: VerificationStatus,
    pub occupants: u32,
    pub occupancy_limit: u32,
}

impl ScoreSignals {
    pub(crate) fn collect(
        application: &RentalApplication,
        property: &PropertySnapshot,
        preferences: &ScoringPreferenceProfile,
    ) -> Self {
        let income_ratio = income_ratio(application, property);
        let guarantor_required = income_ratio
            .map(|ratio| ratio < preferences.criteria.guarantor.required_if_income_below)
            .unwrap_or(true);

        Self {
            income_ratio,
            guarantor_required,
            has_guarantor: application.guarantor.is_some(),
            documents_present: application.documents.required_present(),
            verification: application.documents.verification,
            occupants: application.household.occupants(),
            occupancy_limit: property.occupancy_limit(),
        }
    }
}

/// Awarded points for one criterion before aggregation.
pub(crate) struct CriterionOutcome {
    pub criterion: Criterion,
    pub score: f64,
    pub max: f64,
    /// Share of the weight that was awarded, in [0, 1].
    pub fraction: f64,
    pub details: String,
    pub data_warnings: Vec<String>,
}

impl CriterionOutcome {
    fn new(criterion: Criterion, weight: f64, fraction: f64, details: String) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        Self {
            criterion,
            score: weight * fraction,
            max: weight,
            fraction,
            details,
            data_warnings: Vec::new(),
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.data_warnings.push(warning.into());
        self
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|amount| amount.is_finite() && *amount > 0.0)
}

fn income_ratio(application: &RentalApplication, property: &PropertySnapshot) -> Option<f64> {
    let income = application
        .monthly_income
        .filter(|amount| amount.is_finite() && *amount >= 0.0)?;
    let price = positive(property.monthly_price)?;
    Some(income / price)
}

/// Weighted average of graded sub-checks, each given as (share, fraction).
fn blend(parts: &[(f64, f64)]) -> f64 {
    let total_share: f64 = parts.iter().map(|(share, _)| share.max(0.0)).sum();
    if total_share <= 0.0 {
        return 0.0;
    }
    parts
        .iter()
        .map(|(share, fraction)| share.max(0.0) * fraction.clamp(0.0, 1.0))
        .sum::<f64>()
        / total_share
}

pub(crate) fn score_income_ratio(
    config: &IncomeRatioConfig,
    signals: &ScoreSignals,
) -> CriterionOutcome {
    let Some(ratio) = signals.income_ratio else {
        return CriterionOutcome::new(
            Criterion::IncomeRatio,
            config.weight,
            INCOME_FLOOR_FRACTION,
            "monthly income or rent missing".to_string(),
        )
        .with_warning(
            "Income ratio could not be computed: monthly income or rent is missing; scored at the lowest band",
        );
    };

    let thresholds = config.thresholds;
    let bands = [
        ("excellent", thresholds.excellent, 1.0),
        ("good", thresholds.good, 0.8),
        ("acceptable", thresholds.acceptable, 0.6),
        ("minimum", thresholds.minimum, 0.4),
    ];

    let matched = bands
        .iter()
        .find(|(_, threshold, _)| ratio >= *threshold)
        .copied();

    match matched {
        Some((band, threshold, fraction)) => CriterionOutcome::new(
            Criterion::IncomeRatio,
            config.weight,
            fraction,
            format!("ratio {ratio:.2} meets {band} threshold {threshold:.2}"),
        ),
        None => CriterionOutcome::new(
            Criterion::IncomeRatio,
            config.weight,
            INCOME_FLOOR_FRACTION,
            format!(
                "ratio {ratio:.2} below minimum threshold {:.2}",
                thresholds.minimum
            ),
        ),
    }
}

pub(crate) fn score_stability(
    config: &StabilityConfig,
    application: &RentalApplication,
) -> CriterionOutcome {
    let weight = config.weight;
    let Some(contract) = application.contract_type else {
        return CriterionOutcome::new(
            Criterion::ProfessionalStability,
            weight,
            0.0,
            "contract type missing".to_string(),
        )
        .with_warning("Contract type missing; professional stability scored at its lowest band");
    };

    let mut points = config
        .contract_points
        .get(&contract)
        .copied()
        .unwrap_or(0.0)
        .clamp(0.0, weight);
    let mut details = vec![format!("{} worth {points:.1} points", contract.label())];

    let bonus = &config.seniority_bonus;
    if bonus.enabled && application.seniority_months >= bonus.minimum_months {
        points += bonus.points;
        details.push(format!(
            "seniority bonus {:.1} for {} months",
            bonus.points, application.seniority_months
        ));
    }

    if application.in_trial_period {
        points -= config.trial_period_penalty;
        details.push(format!(
            "trial period penalty {:.1}",
            config.trial_period_penalty
        ));
    }

    let points = points.clamp(0.0, weight);
    let fraction = if weight > 0.0 { points / weight } else { 0.0 };
    CriterionOutcome::new(
        Criterion::ProfessionalStability,
        weight,
        fraction,
        details.join("; "),
    )
}

pub(crate) fn score_guarantor(
    config: &GuarantorConfig,
    application: &RentalApplication,
    property: &PropertySnapshot,
    signals: &ScoreSignals,
) -> CriterionOutcome {
    let weight = config.weight;
    let Some(guarantor) = &application.guarantor else {
        return if signals.guarantor_required {
            CriterionOutcome::new(
                Criterion::Guarantor,
                weight,
                0.0,
                format!(
                    "guarantor required below ratio {:.2} but missing",
                    config.required_if_income_below
                ),
            )
        } else {
            CriterionOutcome::new(
                Criterion::Guarantor,
                weight,
                config.unrequired_credit,
                "no guarantor needed for this income level".to_string(),
            )
        };
    };

    if !config.accepted_types.contains(&guarantor.kind) {
        return CriterionOutcome::new(
            Criterion::Guarantor,
            weight,
            config.partial_credit,
            format!("guarantor type {:?} not accepted", guarantor.kind),
        );
    }

    if !signals.guarantor_required {
        return CriterionOutcome::new(
            Criterion::Guarantor,
            weight,
            1.0,
            "accepted guarantor provided".to_string(),
        );
    }

    // Institutional guarantors cover the rent without an income test.
    let guarantor_ratio = match (
        positive(guarantor.monthly_income),
        positive(property.monthly_price),
    ) {
        (Some(income), Some(price)) => Some(income / price),
        _ => None,
    };
    let sufficient = match guarantor_ratio {
        Some(ratio) => ratio >= config.minimum_income_ratio,
        None => guarantor.kind != GuarantorKind::Individual,
    };

    if sufficient {
        CriterionOutcome::new(
            Criterion::Guarantor,
            weight,
            1.0,
            "accepted guarantor meets income requirement".to_string(),
        )
    } else {
        CriterionOutcome::new(
            Criterion::Guarantor,
            weight,
            config.partial_credit,
            format!(
                "guarantor income below required ratio {:.2}",
                config.minimum_income_ratio
            ),
        )
    }
}

pub(crate) fn score_file_quality(
    config: &FileQualityConfig,
    application: &RentalApplication,
    signals: &ScoreSignals,
) -> CriterionOutcome {
    let completeness = signals.documents_present as f64 / DocumentChecklist::REQUIRED_COUNT as f64;
    let verification = match signals.verification {
        VerificationStatus::Verified => 1.0,
        VerificationStatus::Partial => 0.5,
        VerificationStatus::Unverified => 0.0,
    };
    let presentation = if application.documents.cover_letter {
        1.0
    } else {
        0.0
    };

    let fraction = blend(&[
        (config.completeness_share, completeness),
        (config.verification_share, verification),
        (config.presentation_share, presentation),
    ]);

    CriterionOutcome::new(
        Criterion::FileQuality,
        config.weight,
        fraction,
        format!(
            "{}/{} documents, verification {:?}, cover letter {}",
            signals.documents_present,
            DocumentChecklist::REQUIRED_COUNT,
            signals.verification,
            if application.documents.cover_letter {
                "present"
            } else {
                "absent"
            }
        ),
    )
}

pub(crate) fn score_property_coherence(
    config: &PropertyCoherenceConfig,
    property: &PropertySnapshot,
    signals: &ScoreSignals,
) -> CriterionOutcome {
    let occupants = signals.occupants;
    let occupancy = if occupants == 0 {
        0.0
    } else if occupants <= signals.occupancy_limit {
        1.0
    } else {
        f64::from(signals.occupancy_limit) / f64::from(occupants)
    };

    let surface = positive(property.surface_sqm);
    let space = match surface {
        Some(surface) if config.min_surface_per_occupant > 0.0 => {
            let per_occupant = surface / f64::from(occupants.max(1));
            (per_occupant / config.min_surface_per_occupant).min(1.0)
        }
        Some(_) => 1.0,
        None => 0.0,
    };

    let fraction = blend(&[
        (config.occupancy_share, occupancy),
        (config.space_share, space),
    ]);

    let outcome = CriterionOutcome::new(
        Criterion::PropertyCoherence,
        config.weight,
        fraction,
        format!(
            "{occupants} occupant(s) for a capacity of {}",
            signals.occupancy_limit
        ),
    );

    if surface.is_none() {
        outcome.with_warning("Property surface missing; space per occupant could not be checked")
    } else {
        outcome
    }
}

pub(crate) fn score_income_distribution(
    config: &IncomeDistributionConfig,
    application: &RentalApplication,
) -> CriterionOutcome {
    let earners: Vec<f64> = application
        .household
        .earner_incomes
        .iter()
        .copied()
        .filter(|income| income.is_finite() && *income >= 0.0)
        .collect();

    let balance = if earners.len() <= 1 {
        1.0
    } else {
        let largest = earners.iter().copied().fold(0.0_f64, f64::max);
        let smallest = earners.iter().copied().fold(f64::INFINITY, f64::min);
        if largest <= 0.0 || config.balanced_ratio <= 0.0 {
            0.0
        } else {
            ((smallest / largest) / config.balanced_ratio).min(1.0)
        }
    };

    let declared = application
        .monthly_income
        .filter(|income| income.is_finite() && *income >= 0.0);
    let consistency = match declared {
        None => 0.0,
        Some(_) if earners.is_empty() => 1.0,
        Some(declared) => {
            let combined: f64 = earners.iter().sum();
            let gap = if declared > 0.0 {
                (combined - declared).abs() / declared
            } else if combined > 0.0 {
                f64::INFINITY
            } else {
                0.0
            };
            if gap <= config.tolerance {
                1.0
            } else {
                0.0
            }
        }
    };

    let fraction = blend(&[
        (config.balance_share, balance),
        (config.consistency_share, consistency),
    ]);

    CriterionOutcome::new(
        Criterion::IncomeDistribution,
        config.weight,
        fraction,
        format!(
            "{} earner(s), balance {:.0}%, declared income {}",
            earners.len().max(1),
            balance * 100.0,
            if consistency >= 1.0 {
                "consistent"
            } else {
                "inconsistent"
            }
        ),
    )
}
