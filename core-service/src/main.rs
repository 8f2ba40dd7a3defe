//! FraudShield - Command Line Entry Point

use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use fraudshield_core::constants::{APP_NAME, APP_VERSION, REASON_INPUT_VALIDATION_FAILED, REASON_SCORING_UNAVAILABLE};
use fraudshield_core::logic::knowledge::build_index;
use fraudshield_core::{AuditLog, Decision, Explainer, FeatureVector, FraudShield, Settings};

#[derive(Parser)]
#[command(name = "fraudshield", about = "FraudShield decision & explanation engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide for one transaction and append its audit record.
    Decide {
        /// JSON feature record file, or `-` for stdin.
        #[arg(long)]
        features: String,
    },
    /// Explain a reason code from the knowledge index.
    Explain {
        /// Reason code, e.g. FRAUD_SIGNAL_ANOMALY_SIGNAL.
        reason_code: String,
    },
    /// Build and persist the knowledge index from markdown documents.
    BuildIndex {
        /// Directory of `.md` files (defaults to FRAUDSHIELD_KNOWLEDGE_DIR).
        #[arg(long)]
        knowledge_dir: Option<PathBuf>,
    },
    /// List audit records whose fingerprint matches a feature record.
    VerifyAudit {
        /// JSON feature record file, or `-` for stdin.
        #[arg(long)]
        features: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::debug!("{} v{}", APP_NAME, APP_VERSION);

    let result = Settings::from_env()
        .map_err(|e| -> Box<dyn Error> { e.into() })
        .and_then(|settings| match cli.command {
            Commands::Decide { features } => cmd_decide(&settings, &features),
            Commands::Explain { reason_code } => cmd_explain(&settings, &reason_code),
            Commands::BuildIndex { knowledge_dir } => cmd_build_index(&settings, knowledge_dir),
            Commands::VerifyAudit { features } => cmd_verify_audit(&settings, &features),
        });

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn read_record(source: &str) -> Result<Value, Box<dyn Error>> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(Path::new(source))
            .map_err(|e| format!("failed to read feature file {}: {}", source, e))?
    };
    Ok(serde_json::from_str(&raw)?)
}

fn cmd_decide(settings: &Settings, source: &str) -> Result<(), Box<dyn Error>> {
    // Unparseable JSON is still an input validation failure, not a crash
    let record = read_record(source).unwrap_or_else(|e| {
        log::warn!("Feature record unreadable: {}", e);
        Value::Null
    });

    let decision = match FraudShield::from_settings(settings) {
        Ok(shield) => shield.assess_or_fail_safe(&record).decision,
        Err(e) => {
            let reason = match FeatureVector::from_json(&record) {
                Ok(_) => REASON_SCORING_UNAVAILABLE,
                Err(_) => REASON_INPUT_VALIDATION_FAILED,
            };
            log::warn!("Fail-safe {}: {}", reason, e);
            Decision::fail_safe(reason)
        }
    };

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn cmd_explain(settings: &Settings, reason_code: &str) -> Result<(), Box<dyn Error>> {
    let embedder = settings.build_embedder()?;
    let explainer = Explainer::new(settings.knowledge_paths(), embedder, settings.top_k);
    explainer.preload()?;

    println!("{}", explainer.explain(reason_code)?);
    Ok(())
}

fn cmd_build_index(settings: &Settings, knowledge_dir: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let dir = knowledge_dir.unwrap_or_else(|| settings.knowledge_dir.clone());
    let embedder = settings.build_embedder()?;

    let knowledge = build_index(&dir, embedder.as_ref())?;
    let paths = settings.knowledge_paths();
    knowledge.persist(&paths)?;

    println!(
        "indexed {} chunks from {} ({}) -> {}",
        knowledge.len(),
        dir.display(),
        embedder.model_id(),
        paths.index.display()
    );
    Ok(())
}

fn cmd_verify_audit(settings: &Settings, source: &str) -> Result<(), Box<dyn Error>> {
    let features = FeatureVector::from_json(&read_record(source)?)?;
    let log = AuditLog::new(&settings.audit_log_path);

    let matches = log.verify(&features)?;
    if matches.is_empty() {
        println!("no audit record matches this feature vector");
        return Ok(());
    }

    for (line, record) in matches {
        println!("line {}: {}", line, record.to_jsonl()?);
    }
    Ok(())
}
