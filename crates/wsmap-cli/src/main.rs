use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wsmap_core::{AssignmentStatus, Config, Diagnostic, NameSource, Report, Severity};
use wsmap_engine::{audit, parse_sheet_list, plan_worksets, Orchestrator};
use wsmap_host::SnapshotHost;
use wsmap_pipeline::{load_or_extract, query_model, respond, FeaturePipeline, ModelQuery};

/// wsmap - Assign host elements to worksets by name prefix
#[derive(Parser)]
#[command(name = "wsmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: wsmap.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify elements of a model snapshot and assign their worksets
    Classify {
        /// Model snapshot (JSON export)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Rule profile to use (default: config default or first profile)
        #[arg(short, long)]
        profile: Option<String>,

        /// Classify only; do not write anything
        #[arg(long)]
        dry_run: bool,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,

        /// Save committed changes back to the snapshot
        #[arg(short, long)]
        write: bool,
    },

    /// Check rule tables for contradictions and unreachable rules
    Audit {
        /// Profile to audit (default: all profiles)
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Run external feature detection on the model's point clouds
    Detect {
        /// Model snapshot (JSON export)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Write the detected feature count into this attribute of every point cloud
        #[arg(short, long)]
        annotate: Option<String>,

        /// Save committed changes back to the snapshot
        #[arg(short, long)]
        write: bool,
    },

    /// Answer one model query read from stdin
    ModelService,

    /// Ask the model service a question about a snapshot
    Query {
        /// Model snapshot (JSON export)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Question to send
        question: String,
    },

    /// Parse a tab-separated sheet list and show the sheets to create
    PlanSheets {
        /// File with one `number<TAB>name` line per sheet
        file: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which worksets from a list still have to be created
    PlanWorksets {
        /// File with one workset name per line
        file: PathBuf,

        /// Model snapshot listing the existing worksets
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    // The service speaks plain stdin/stdout and needs no configuration
    if let Commands::ModelService = cli.command {
        model_service_command();
    }

    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    tracing::debug!(
        profiles = config.profiles.len(),
        root = %config.project_root.display(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Classify { snapshot, profile, dry_run, output, markdown, write } => {
            classify_command(
                &config,
                &snapshot,
                profile.as_deref(),
                dry_run,
                &output,
                markdown.as_deref(),
                write,
                cli.verbose,
            )
        }
        Commands::Audit { profile } => audit_command(&config, profile.as_deref()),
        Commands::Detect { snapshot, annotate, write } => {
            detect_command(&config, &snapshot, annotate.as_deref(), write, cli.verbose).await
        }
        Commands::ModelService => Ok(()),
        Commands::Query { snapshot, question } => {
            query_command(&config, &snapshot, &question).await
        }
        Commands::PlanSheets { file, json } => plan_sheets_command(&file, json),
        Commands::PlanWorksets { file, snapshot, json } => {
            plan_worksets_command(&file, &snapshot, json)
        }
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new("wsmap.toml").exists() {
        Config::from_file(Path::new("wsmap.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using built-in wall rules".yellow());
        }
        Config::default()
    };

    if verbose {
        eprintln!(
            "{} {} profile(s), attribute '{}'",
            "Using".cyan(),
            config.profiles.len(),
            config.attribute
        );
    }

    Ok(config)
}

fn load_snapshot(path: &Path, verbose: bool) -> Result<SnapshotHost> {
    if verbose {
        eprintln!("{} {}", "Loading snapshot from:".cyan(), path.display());
    }
    SnapshotHost::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Classify command - classify and assign worksets
#[allow(clippy::too_many_arguments)]
fn classify_command(
    config: &Config,
    snapshot: &Path,
    profile: Option<&str>,
    dry_run: bool,
    output: &Path,
    markdown: Option<&Path>,
    write: bool,
    verbose: bool,
) -> Result<()> {
    let profile = config.profile(profile)?;
    let mut host = load_snapshot(snapshot, verbose)?.with_name_source(profile.name_source);

    if verbose {
        eprintln!(
            "{} profile '{}' ({} rules){}",
            "Classifying with".cyan(),
            profile.name,
            profile.rules.len(),
            if dry_run { ", dry run" } else { "" }
        );
    }

    let mut report = Report::new(&profile.name, profile.rules.fingerprint()).with_dry_run(dry_run);
    report.extend_diagnostics(audit(&profile.name, &profile.rules, &config.severity));

    let run = Orchestrator::new(&mut host, &config.attribute)
        .with_dry_run(dry_run)
        .with_severity(config.severity.clone())
        .run_profile(profile)?;

    let diagnostics = run.diagnostics;
    let mut report = report.with_outcome(run.outcome, run.assignments);
    report.extend_diagnostics(diagnostics);

    report.save_to_file(output)?;
    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), output.display());
    }

    if let Some(md_path) = markdown {
        std::fs::write(md_path, report.to_markdown())?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    if write && !dry_run {
        host.save(snapshot)?;
        if verbose {
            eprintln!(
                "{} {} ({} writes)",
                "Snapshot updated:".green(),
                snapshot.display(),
                host.committed_writes()
            );
        }
    }

    print_classification_summary(&report);

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Audit command - check rule tables
fn audit_command(config: &Config, profile: Option<&str>) -> Result<()> {
    let names: Vec<&str> = match profile {
        Some(name) => vec![name],
        None => {
            let mut names: Vec<&str> = Vec::new();
            for p in &config.profiles {
                if !names.contains(&p.name.as_str()) {
                    names.push(&p.name);
                }
            }
            names
        }
    };

    let mut diagnostics = Vec::new();
    for name in names {
        let profile = config.profile(Some(name))?;
        diagnostics.extend(audit(&profile.name, &profile.rules, &config.severity));
    }

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Rule Audit".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        print_diagnostics(&diagnostics);
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        std::process::exit(1);
    }

    Ok(())
}

/// Detect command - run the external feature detector
async fn detect_command(
    config: &Config,
    snapshot: &Path,
    annotate: Option<&str>,
    write: bool,
    verbose: bool,
) -> Result<()> {
    let mut host = load_snapshot(snapshot, verbose)?;
    let pipeline = FeaturePipeline::new(config.pipeline_config());

    if verbose {
        eprintln!(
            "{} {} in {}",
            "Running".cyan(),
            pipeline.config().program.display(),
            pipeline.config().working_dir.display()
        );
    }

    let (run, annotation) = match annotate {
        Some(key) => {
            let (run, outcome) = pipeline.run_and_annotate(&mut host, key).await?;
            (run, Some(outcome))
        }
        None => (pipeline.run(&host).await?, None),
    };

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Feature Detection".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{} {}", "Point clouds:".bold(), run.point_clouds.len());
    println!("{} {}", "Features:".bold(), run.report.detected_features.len());
    println!();

    for (i, feature) in run.report.detected_features.iter().enumerate() {
        println!("  {}. {}", i + 1, feature.describe().yellow());
    }

    if let Some(outcome) = &annotation {
        println!();
        println!(
            "{} {} written, {} failed",
            "Annotated:".bold(),
            format!("{}", outcome.mutation_succeeded).green(),
            if outcome.mutation_failed > 0 {
                format!("{}", outcome.mutation_failed).red().bold()
            } else {
                format!("{}", outcome.mutation_failed).green()
            }
        );
        for failure in &outcome.failures {
            println!("    {} {}: {}", "✗".red(), failure.entity, failure.message);
        }

        if write {
            host.save(snapshot)?;
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());

    Ok(())
}

/// Model-service command - one request on stdin, one line on stdout
fn model_service_command() -> ! {
    let mut input = String::new();
    let (line, exit_code) = match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => service_reply(&input),
        Err(e) => (format!("Error: {}", e), 1),
    };

    println!("{}", line);
    std::process::exit(exit_code);
}

/// Reply line and exit code for one raw service request
fn service_reply(input: &str) -> (String, i32) {
    match respond(input) {
        Ok(response) => (response, 0),
        Err(e) => (format!("Error: {}", e), 1),
    }
}

/// Query command - ask the model service about a snapshot
async fn query_command(config: &Config, snapshot: &Path, question: &str) -> Result<()> {
    // The service is sent element names, not type names
    let host = load_snapshot(snapshot, false)?.with_name_source(NameSource::Instance);

    let mut service = config.model_service_config();
    if config.model_service.is_none() {
        // Without configuration, call this binary's own model-service
        if let Ok(exe) = std::env::current_exe() {
            service.program = exe;
        }
    }

    let elements = load_or_extract(&service.cache_file, &host)?;
    let query = ModelQuery::new(question, &elements)?;
    let reply = query_model(&service, &query).await?;

    println!("{}", reply);
    Ok(())
}

/// Plan-sheets command - parse a sheet list
fn plan_sheets_command(file: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read sheet list {}", file.display()))?;
    let rows = parse_sheet_list(&text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} {}", "Sheets to create:".bold(), rows.len());
    for row in &rows {
        println!("  {:<12} {}", row.number.cyan(), row.name);
    }

    Ok(())
}

/// Plan-worksets command - compare a workset list with the model
fn plan_worksets_command(file: &Path, snapshot: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read workset list {}", file.display()))?;
    let host = load_snapshot(snapshot, false)?;

    let plan = plan_worksets(
        text.lines(),
        host.snapshot().worksets.iter().map(String::as_str),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{} {}", "Worksets to create:".bold(), plan.create.len());
    for name in &plan.create {
        println!("  {} {}", "+".green(), name);
    }
    if !plan.skipped.is_empty() {
        println!("{} {}", "Already present:".bold(), plan.skipped.len());
        for name in &plan.skipped {
            println!("  {} {}", "=".yellow(), name);
        }
    }

    Ok(())
}

fn print_classification_summary(report: &Report) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Workset Classification Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Profile: {}", report.profile);
    println!("Rules:   {}", &report.rules_fingerprint[..report.rules_fingerprint.len().min(12)]);
    if report.dry_run {
        println!("{}", "Dry run: nothing was written".yellow());
    }
    println!();

    let outcome = &report.outcome;
    println!("{}", "Outcome:".bold());
    println!("  Classified:   {}", outcome.classified);
    println!("  Unclassified: {}", outcome.unclassified);
    println!("  Assigned:     {}", format!("{}", outcome.mutation_succeeded).green());
    if outcome.mutation_failed > 0 {
        println!("  Failed:       {}", format!("{}", outcome.mutation_failed).red().bold());
    } else {
        println!("  Failed:       {}", format!("{}", outcome.mutation_failed).green());
    }
    println!();

    let planned: Vec<_> = report
        .assignments
        .iter()
        .filter(|a| a.status == AssignmentStatus::Planned)
        .collect();
    if !planned.is_empty() {
        println!("{}", "Planned assignments:".bold());
        for assignment in planned {
            println!(
                "  {} {} -> {}",
                assignment.entity,
                assignment.name.as_deref().unwrap_or("<unnamed>"),
                assignment.target.as_ref().map(|t| t.to_string()).unwrap_or_default().cyan()
            );
        }
        println!();
    }

    // Unmatched entities are listed in the report; only count them here
    let notable: Vec<Diagnostic> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity != Severity::Info)
        .cloned()
        .collect();

    if notable.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        print_diagnostics(&notable);
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    println!("{}", "Diagnostics:".bold());
    for diag in diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };

        println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

        if let Some(loc) = &diag.location {
            println!("    at {}", loc);
        }

        if let Some(exp) = &diag.expected {
            println!("    Expected: {}", exp);
        }
        if let Some(act) = &diag.actual {
            println!("    Actual:   {}", act);
        }
    }
}
