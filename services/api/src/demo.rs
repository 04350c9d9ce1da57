use crate::infra::{build_scoring_service, parse_model_type};
use chrono::Utc;
use clap::Args;
use tenant_scoring::compatibility::{
    ApplicationId, Criterion, EventType, ModelType, OwnerId, PropertyId, ScoreResult, ScoringEvent,
    ScoringPreferenceProfile,
};
use tenant_scoring::config::ScoringConfig;
use tenant_scoring::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Owner whose rubric is applied
    #[arg(long, default_value = "owner-demo")]
    pub(crate) owner: String,
    /// Seeded listing to score against (A-201 or B-014)
    #[arg(long, default_value = "A-201")]
    pub(crate) property: String,
    /// Rubric preset to install before scoring (strict, standard, flexible)
    #[arg(long, value_parser = parse_model_type)]
    pub(crate) model: Option<ModelType>,
    /// Print the full JSON result for every applicant
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        owner,
        property,
        model,
        json,
    } = args;

    let owner_id = OwnerId(owner);
    let property_id = PropertyId(property);
    let (service, applications) = build_scoring_service(&ScoringConfig::default());

    let _listener = service
        .engine()
        .subscribe(EventType::PreferencesUpdated, |event| {
            if let ScoringEvent::PreferencesUpdated { owner_id, version } = event {
                println!("- Rubric for {owner_id} now at version {version}");
            }
        });

    println!("Compatibility scoring demo");
    if let Some(model) = model {
        let preset = ScoringPreferenceProfile::preset(owner_id.clone(), model, Utc::now());
        service.update_preferences(&owner_id, preset)?;
    } else {
        println!("- No rubric installed; the standard preset applies");
    }

    let results = service
        .score_batch(&owner_id, &property_id, &applications.ids())
        .await?;

    println!("\nListing {property_id}");
    for (application_id, result) in &results {
        render_result(application_id, result);
        if json {
            match serde_json::to_string_pretty(result) {
                Ok(payload) => println!("{payload}"),
                Err(err) => println!("  JSON payload unavailable: {err}"),
            }
        }
    }

    let stats = service.engine().cache_stats();
    println!(
        "\nCache: {} entries | {} hits | {} misses",
        stats.entries, stats.hits, stats.misses
    );
    Ok(())
}

fn render_result(application_id: &ApplicationId, result: &ScoreResult) {
    println!(
        "- {application_id}: {}/100 ({} rubric) -> {}",
        result.total_score,
        result.model_used.label(),
        if result.compatible {
            "compatible"
        } else {
            "not compatible"
        }
    );
    for criterion in Criterion::ALL {
        if let Some(entry) = result.breakdown.get(&criterion) {
            println!(
                "    {:<24} {:>5.1} / {:<5.1} {}",
                criterion.label(),
                entry.score,
                entry.max,
                entry.details
            );
        }
    }
    for exclusion in &result.exclusions {
        println!("    excluded: {exclusion}");
    }
    for warning in &result.warnings {
        println!("    warning: {warning}");
    }
    for recommendation in &result.recommendations {
        println!("    advice: {recommendation}");
    }
}
