use super::criteria::{CriterionOutcome, ScoreSignals};
use crate::compatibility::domain::{DocumentChecklist, VerificationStatus};
use crate::compatibility::preferences::{Criterion, ExclusionRule, ScoringPreferenceProfile};

const RECOMMENDATION_LOW: f64 = 0.6;
const RECOMMENDATION_HIGH: f64 = 0.8;
const WARNING_BELOW: f64 = 0.5;

/// Evaluate every enabled exclusion rule in declaration order.
pub(crate) fn matched_exclusions(
    preferences: &ScoringPreferenceProfile,
    signals: &ScoreSignals,
) -> Vec<String> {
    let rules = [
        ExclusionRule::IncompleteFile,
        ExclusionRule::NoGuarantorWhenRequired,
        ExclusionRule::InsufficientIncomeRatio,
        ExclusionRule::UnverifiedDocuments,
        ExclusionRule::HouseholdIncoherence,
    ];

    rules
        .into_iter()
        .filter(|rule| preferences.rule_enabled(*rule))
        .filter_map(|rule| exclusion_reason(rule, preferences, signals))
        .collect()
}

fn exclusion_reason(
    rule: ExclusionRule,
    preferences: &ScoringPreferenceProfile,
    signals: &ScoreSignals,
) -> Option<String> {
    match rule {
        ExclusionRule::IncompleteFile => (signals.documents_present
            < DocumentChecklist::REQUIRED_COUNT)
            .then(|| {
                format!(
                    "Incomplete rental file: {} of {} required documents provided",
                    signals.documents_present,
                    DocumentChecklist::REQUIRED_COUNT
                )
            }),
        ExclusionRule::NoGuarantorWhenRequired => (signals.guarantor_required
            && !signals.has_guarantor)
            .then(|| {
                format!(
                    "Guarantor required (income ratio below {:.2}) but none provided",
                    preferences.criteria.guarantor.required_if_income_below
                )
            }),
        ExclusionRule::InsufficientIncomeRatio => {
            let floor = preferences.criteria.income_ratio.absolute_floor;
            match signals.income_ratio {
                Some(ratio) if ratio >= floor => None,
                Some(ratio) => Some(format!(
                    "Income ratio {ratio:.2} below absolute floor {floor:.2}"
                )),
                None => Some("Income ratio unavailable: income or rent missing".to_string()),
            }
        }
        ExclusionRule::UnverifiedDocuments => (signals.verification
            == VerificationStatus::Unverified)
            .then(|| "Supporting documents have not been verified".to_string()),
        ExclusionRule::HouseholdIncoherence => {
            if signals.occupants == 0 {
                Some("Household composition is empty".to_string())
            } else if signals.occupants > signals.occupancy_limit {
                Some(format!(
                    "Household of {} exceeds property capacity of {}",
                    signals.occupants, signals.occupancy_limit
                ))
            } else {
                None
            }
        }
    }
}

/// Split per-criterion outcomes into recommendations and warnings, in criterion order.
pub(crate) fn advice(outcomes: &[CriterionOutcome]) -> (Vec<String>, Vec<String>) {
    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        warnings.extend(outcome.data_warnings.iter().cloned());

        if outcome.fraction < WARNING_BELOW {
            warnings.push(format!(
                "{} scored below half of its weight ({:.1}/{:.1})",
                capitalize(outcome.criterion.label()),
                outcome.score,
                outcome.max
            ));
        } else if (RECOMMENDATION_LOW..RECOMMENDATION_HIGH).contains(&outcome.fraction) {
            recommendations.push(format!(
                "{}: {}",
                capitalize(outcome.criterion.label()),
                hint(outcome.criterion)
            ));
        }
    }

    (recommendations, warnings)
}

fn hint(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::IncomeRatio => "a co-applicant or guarantor would strengthen the income ratio",
        Criterion::ProfessionalStability => {
            "proof of seniority or a confirmed contract would strengthen the file"
        }
        Criterion::Guarantor => "an accepted guarantor with sufficient income is advised",
        Criterion::FileQuality => "complete and verify the supporting documents",
        Criterion::PropertyCoherence => "confirm the household fits the property",
        Criterion::IncomeDistribution => "document each earner's share of the household income",
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
