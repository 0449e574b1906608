//! rxauth - Prior Authorization Workflow CLI
//!
//! Drives the PA decision pipeline end-to-end against a seeded in-memory
//! dataset: coverage checks, clinical eligibility, PA form generation, and
//! the full prescription workflow.
//!
//! ## Commands
//!
//! - `coverage`: Check drug coverage for a patient or a plan
//! - `eligibility`: Run the LLM clinical eligibility check
//! - `form`: Generate a PA form (eligibility + narrative)
//! - `process`: Run the complete workflow
//! - `plans`: List demo plans and covered drugs
//! - `index-stats`: Show policy index statistics

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use rxauth_core::{
    init_tracing, write_form_artifact, CoverageResolver, CoverageStore, EligibilityReasoner,
    FormAssembler, PatientStore, PolicyRetriever, WorkflowOrchestrator,
};
use rxauth_llm::fakes::ScriptedModel;
use rxauth_llm::{build_model, InstrumentedModel, LanguageModel, LlmProvider};

mod demo;

const OFFLINE_ELIGIBILITY_REPLY: &str = r#"{
    "meets_criteria": true,
    "confidence_score": 0.84,
    "clinical_justification": "Offline demo determination: lab values and treatment history satisfy the configured policy thresholds.",
    "recommendation": "APPROVE"
}"#;

const OFFLINE_NARRATIVE_REPLY: &str = "Offline demo narrative: the patient has documented \
    first-line treatment failure and meets the plan's clinical criteria for the requested \
    therapy. Escalation is medically necessary to achieve glycemic control.";

#[derive(Parser)]
#[command(name = "rxauth")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prior authorization workflow automation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// LLM provider: cerebras (default) or openrouter
    #[arg(long, global = true, env = "LLM_PROVIDER", default_value = "cerebras")]
    provider: String,

    /// Use canned offline model replies instead of a live endpoint
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check drug coverage for a patient or a plan
    Coverage {
        /// Drug name (case-sensitive formulary match)
        drug: String,

        /// Patient ID to resolve the plan from
        #[arg(short, long)]
        patient: Option<String>,

        /// Plan name, checked directly without a patient
        #[arg(long)]
        plan: Option<String>,
    },

    /// Run the LLM clinical eligibility check for a patient and drug
    Eligibility {
        /// Patient ID
        patient: String,

        /// Drug name
        drug: String,

        /// Policy criteria to evaluate against
        #[arg(long, default_value = "Standard medical necessity criteria")]
        criteria: String,

        /// Disable retrieval-augmented context
        #[arg(long)]
        no_rag: bool,
    },

    /// Generate a complete PA form (runs eligibility first)
    Form {
        /// Patient ID
        patient: String,

        /// Drug name
        drug: String,

        /// Prescribing provider name
        #[arg(long, default_value = "Dr. Unknown")]
        provider_name: String,

        /// Provider NPI
        #[arg(long, default_value = "0000000000")]
        npi: String,

        /// Render the form as markdown instead of JSON
        #[arg(long)]
        markdown: bool,

        /// Persist JSON + markdown artifacts into this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Run the end-to-end prescription workflow
    Process {
        /// Patient ID
        patient: String,

        /// Drug name
        drug: String,

        /// Prescribing provider name
        #[arg(long, default_value = "Dr. Unknown")]
        provider_name: String,

        /// Provider NPI
        #[arg(long, default_value = "0000000000")]
        npi: String,
    },

    /// List demo plans with their covered drugs
    Plans,

    /// Show policy index statistics
    IndexStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let (patients, coverage, index) = demo::seeded_stores().await?;
    let patients = Arc::new(patients);
    let coverage = Arc::new(coverage);
    let index = Arc::new(index);

    match cli.command {
        Commands::Coverage { drug, patient, plan } => {
            let resolver = CoverageResolver::new(patients, coverage);
            let outcome = match (patient, plan) {
                (Some(patient_id), None) => resolver.resolve(&patient_id, &drug).await?,
                (None, Some(plan_name)) => resolver.resolve_plan(&plan_name, &drug).await?,
                _ => bail!("provide exactly one of --patient or --plan"),
            };
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Eligibility {
            patient,
            drug,
            criteria,
            no_rag,
        } => {
            let model = select_model(&cli.provider, cli.offline, &[OFFLINE_ELIGIBILITY_REPLY])?;
            let reasoner = EligibilityReasoner::new(model, index);
            let record = patients
                .get_patient(&patient)
                .await?
                .ok_or_else(|| anyhow::anyhow!("patient not found: {patient}"))?;
            let verdict = reasoner.evaluate(&record, &drug, &criteria, !no_rag).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }

        Commands::Form {
            patient,
            drug,
            provider_name,
            npi,
            markdown,
            output_dir,
        } => {
            let model = select_model(
                &cli.provider,
                cli.offline,
                &[OFFLINE_ELIGIBILITY_REPLY, OFFLINE_NARRATIVE_REPLY],
            )?;
            let reasoner = EligibilityReasoner::new(model.clone(), index);
            let record = patients
                .get_patient(&patient)
                .await?
                .ok_or_else(|| anyhow::anyhow!("patient not found: {patient}"))?;
            let verdict = reasoner
                .evaluate(&record, &drug, "Standard medical necessity criteria", true)
                .await?;

            let assembler = FormAssembler::new(patients, model);
            let form = assembler
                .generate(&patient, &drug, &verdict, &provider_name, &npi)
                .await?;

            if let Some(dir) = output_dir {
                let path = write_form_artifact(&form, &dir)?;
                eprintln!("wrote {}", path.display());
            }

            if markdown {
                println!("{}", form.to_markdown());
            } else {
                println!("{}", serde_json::to_string_pretty(&form)?);
            }
        }

        Commands::Process {
            patient,
            drug,
            provider_name,
            npi,
        } => {
            let model = select_model(
                &cli.provider,
                cli.offline,
                &[OFFLINE_ELIGIBILITY_REPLY, OFFLINE_NARRATIVE_REPLY],
            )?;
            let orchestrator = WorkflowOrchestrator::new(patients, coverage, index, model);
            let result = orchestrator
                .process_prescription(&patient, &drug, &provider_name, &npi)
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Plans => {
            let resolver = CoverageResolver::new(patients, coverage.clone());
            let mut listing = Vec::new();
            for plan in coverage.list_plans().await? {
                let covered = resolver.covered_alternatives(&plan).await?;
                listing.push(serde_json::json!({
                    "plan": plan,
                    "covered_drugs": covered
                        .iter()
                        .map(|r| r.drug.clone())
                        .collect::<Vec<_>>(),
                }));
            }
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }

        Commands::IndexStats => {
            let retriever = PolicyRetriever::new(index);
            let stats = retriever.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Resolve the model handle: scripted replies offline, a configured
/// provider wrapped in the telemetry interceptor otherwise.
fn select_model(
    provider: &str,
    offline: bool,
    offline_script: &[&str],
) -> Result<Arc<dyn LanguageModel>> {
    if offline {
        return Ok(Arc::new(ScriptedModel::new(offline_script.to_vec())));
    }
    let provider: LlmProvider = provider.parse()?;
    Ok(InstrumentedModel::wrap(build_model(provider)))
}
