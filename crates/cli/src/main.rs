use clap::{Parser, Subcommand};
use diet_core::constants::{DEFAULT_DATASET_PATH, DEFAULT_MODEL_PATH, DEFAULT_TABLES_PATH};
use diet_core::{
    check_safety, model_mode_from_env_value, sanitize_diet_plan, validate_value, CoreConfig,
    DietPlan, FeatureCodec, FeatureTables, ReferenceDataset, ServiceContext,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ayurdiet")]
#[command(about = "Ayurvedic diet inference tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit feature tables from a reference dataset and persist them
    BuildTables {
        /// Reference dataset (CSV with a header row)
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,
        /// Output YAML file; mappings.json is written next to it
        #[arg(long, default_value = DEFAULT_TABLES_PATH)]
        out: PathBuf,
    },
    /// Validate a patient record and print the sanitized echo
    Validate {
        /// Patient record JSON file
        record: PathBuf,
    },
    /// Encode a patient record with persisted feature tables
    Encode {
        /// Patient record JSON file
        record: PathBuf,
        #[arg(long, default_value = DEFAULT_TABLES_PATH)]
        tables: PathBuf,
    },
    /// Print the clinical safety warnings for a patient record
    CheckSafety {
        /// Patient record JSON file
        record: PathBuf,
    },
    /// Filter a diet plan for a patient's restrictions
    SanitizePlan {
        /// Patient record JSON file
        record: PathBuf,
        /// Diet plan JSON file
        plan: PathBuf,
    },
    /// Run the full prediction pipeline on a patient record
    Predict {
        /// Patient record JSON file
        record: PathBuf,
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
        /// "estimator" or "pipeline"
        #[arg(long, default_value = "estimator")]
        mode: String,
        #[arg(long, default_value = DEFAULT_DATASET_PATH)]
        dataset: PathBuf,
        #[arg(long, default_value = DEFAULT_TABLES_PATH)]
        tables: PathBuf,
        /// Also produce a sanitized diet plan
        #[arg(long)]
        plan: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("diet_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::BuildTables { dataset, out }) => {
            let dataset = ReferenceDataset::from_path(&dataset)?;
            let tables = FeatureTables::build(&dataset);
            tables.save(&out)?;
            println!(
                "Built {} encoders and {} scalers into {}",
                tables.encoders.len(),
                tables.scalers.len(),
                out.display()
            );
        }
        Some(Commands::Validate { record }) => match validate_value(&read_json(&record)?) {
            Ok(record) => print_json(&record)?,
            Err(e) => {
                eprintln!("{e}");
                for violation in e.violations() {
                    eprintln!("  - {violation}");
                }
                std::process::exit(1);
            }
        },
        Some(Commands::Encode { record, tables }) => {
            let record = validate_value(&read_json(&record)?)?;
            let codec = FeatureCodec::new(FeatureTables::load(&tables)?);
            let encoded = codec.encode(&record);
            let warnings: Vec<String> = encoded.warnings.iter().map(ToString::to_string).collect();
            print_json(&json!({
                "columns": encoded.vector.columns(),
                "values": encoded.vector.values(),
                "warnings": warnings,
            }))?;
        }
        Some(Commands::CheckSafety { record }) => {
            let record = validate_value(&read_json(&record)?)?;
            let warnings = check_safety(&record);
            if warnings.is_empty() {
                println!("No safety warnings.");
            } else {
                for warning in warnings {
                    println!("{warning}");
                }
            }
        }
        Some(Commands::SanitizePlan { record, plan }) => {
            let record = validate_value(&read_json(&record)?)?;
            let mut plan: DietPlan = serde_json::from_value(read_json(&plan)?)?;
            sanitize_diet_plan(&mut plan, &record);
            print_json(&plan)?;
        }
        Some(Commands::Predict {
            record,
            model,
            mode,
            dataset,
            tables,
            plan,
        }) => {
            let cfg = CoreConfig::new(model, model_mode_from_env_value(Some(mode))?, dataset, tables)?;
            let ctx = ServiceContext::initialise(&cfg)?;
            let raw = read_json(&record)?;
            let response = if plan {
                ctx.generate_diet_plan(&raw)?
            } else {
                ctx.predict(&raw)?
            };
            print_json(&response)?;
        }
        None => {
            println!("No command given. Use --help for usage.");
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
