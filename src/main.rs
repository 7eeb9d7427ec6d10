// SPDX-License-Identifier: PMPL-1.0-or-later
//! wcag-auditor CLI - audit HTML pages against WCAG rules
//!
//! Runs the built-in rules over a file or a directory of pages and manages
//! the persisted user configuration (target level and rule overrides).

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use wcag_auditor::config::{load_user_config_or_default, ConfigStore, FileConfigStore, UserConfig};
use wcag_auditor::engine::AuditRunner;
use wcag_auditor::report::export::{export_filename, CSV_BOM};
use wcag_auditor::report::{generate_batch_report, generate_report, AuditReport, OutputFormat};
use wcag_auditor::rules::{builtin_rules, register_builtin_rules};
use wcag_auditor::scanner;
use wcag_auditor::wcag::WcagLevel;

/// WCAG accessibility auditor for HTML pages
#[derive(Parser)]
#[command(name = "wcag-auditor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.wcag-auditor/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an HTML file or every page below a directory
    Audit {
        /// File or directory to audit
        path: PathBuf,

        /// Target WCAG level (default: the saved configuration)
        #[arg(long)]
        level: Option<WcagLevelArg>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file or directory (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Rules to skip for this run
        #[arg(long, value_delimiter = ',')]
        disable: Vec<String>,

        /// Rules to force on for this run
        #[arg(long, value_delimiter = ',')]
        enable: Vec<String>,
    },

    /// List the built-in rules
    Rules {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration in effect
    Show,
    /// Set the target WCAG level
    SetLevel { level: WcagLevelArg },
    /// Enable a rule
    Enable { rule: String },
    /// Disable a rule
    Disable { rule: String },
    /// Restore AA with every rule enabled
    Reset,
}

/// WCAG conformance level CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum WcagLevelArg {
    /// Level A - minimum
    A,
    /// Level AA - standard
    Aa,
    /// Level AAA - enhanced
    Aaa,
}

impl From<WcagLevelArg> for WcagLevel {
    fn from(arg: WcagLevelArg) -> Self {
        match arg {
            WcagLevelArg::A => WcagLevel::A,
            WcagLevelArg::Aa => WcagLevel::AA,
            WcagLevelArg::Aaa => WcagLevel::AAA,
        }
    }
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Flat JSON export
    Json,
    /// Flat CSV export
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wcag_auditor=debug")
    } else {
        EnvFilter::new("wcag_auditor=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = match cli.config {
        Some(path) => FileConfigStore::new(path),
        None => FileConfigStore::default_location()?,
    };

    match cli.command {
        Commands::Audit { path, level, format, output, disable, enable } => {
            let overrides = RunOverrides {
                level: level.map(Into::into),
                enable,
                disable,
            };
            let has_errors = audit(&path, store, overrides, format.into(), output.as_deref()).await?;
            if has_errors {
                std::process::exit(1);
            }
        }

        Commands::Rules { json } => {
            let mut runner = AuditRunner::new();
            register_builtin_rules(&mut runner)?;
            let rules = runner.list_rules();

            if json {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else {
                for rule in rules {
                    println!(
                        "{:<26} {:<12} {:<6} {}",
                        rule.id,
                        rule.wcag.to_string(),
                        rule.severity.as_str(),
                        rule.description
                    );
                }
            }
        }

        Commands::Config { action } => configure(&store, action).await?,
    }

    Ok(())
}

/// Per-run adjustments layered over the saved configuration
struct RunOverrides {
    level: Option<WcagLevel>,
    enable: Vec<String>,
    disable: Vec<String>,
}

impl RunOverrides {
    fn is_empty(&self) -> bool {
        self.level.is_none() && self.enable.is_empty() && self.disable.is_empty()
    }
}

/// Run the audit and write the report; returns whether error-severity violations were found
async fn audit(
    path: &Path,
    store: FileConfigStore,
    overrides: RunOverrides,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<bool> {
    let store = Rc::new(store);
    let mut runner = AuditRunner::new().with_config_store(store.clone());
    register_builtin_rules(&mut runner)?;

    // Without overrides the runner loads the saved configuration itself
    let config = if overrides.is_empty() {
        None
    } else {
        let mut config = load_user_config_or_default(&*store).await;
        if let Some(level) = overrides.level {
            config.target_level = level;
        }
        for (ids, enabled) in [(&overrides.enable, true), (&overrides.disable, false)] {
            for id in ids {
                ensure_known_rule(id)?;
                config.set_rule_enabled(id, enabled);
            }
        }
        Some(config)
    };

    let content;
    let has_errors;
    if path.is_dir() {
        let reports = scanner::scan_directory(&mut runner, path, config.as_ref()).await?;
        content = generate_batch_report(&reports, format);
        has_errors = reports.iter().any(AuditReport::has_errors);
    } else {
        let report = scanner::scan_file(&mut runner, path, config.as_ref())
            .await
            .with_context(|| format!("Failed to audit {}", path.display()))?;
        content = generate_report(&report, format);
        has_errors = report.has_errors();
    }

    write_output(&content, format, output).await?;
    Ok(has_errors)
}

async fn configure(store: &FileConfigStore, action: ConfigAction) -> anyhow::Result<()> {
    if let ConfigAction::Show = action {
        let config = load_user_config_or_default(store).await;
        println!("# {}", store.path().display());
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut config = store
        .load_user_config()
        .await
        .with_context(|| format!("Failed to read {}", store.path().display()))?
        .unwrap_or_default();

    match action {
        ConfigAction::Show => {}
        ConfigAction::SetLevel { level } => config.target_level = level.into(),
        ConfigAction::Enable { rule } => {
            ensure_known_rule(&rule)?;
            config.set_rule_enabled(&rule, true);
        }
        ConfigAction::Disable { rule } => {
            ensure_known_rule(&rule)?;
            config.set_rule_enabled(&rule, false);
        }
        ConfigAction::Reset => {
            config = UserConfig::reset_for(builtin_rules().iter().map(|(id, _)| *id));
        }
    }

    store.save_user_config(&config).await?;
    eprintln!("Configuration saved to {}", store.path().display());
    Ok(())
}

fn ensure_known_rule(id: &str) -> anyhow::Result<()> {
    if builtin_rules().iter().any(|(known, _)| *known == id) {
        Ok(())
    } else {
        bail!("Unknown rule: {}", id)
    }
}

/// Write output to a file, into a directory under a generated name, or to stdout
async fn write_output(content: &str, format: OutputFormat, path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        println!("{}", content);
        return Ok(());
    };

    let target = if path.is_dir() {
        path.join(export_filename(Utc::now(), format.extension()))
    } else {
        path.to_path_buf()
    };

    let bytes = match format {
        OutputFormat::Csv => format!("{}{}", CSV_BOM, content),
        _ => content.to_string(),
    };
    tokio::fs::write(&target, bytes)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    eprintln!("Report written to {}", target.display());
    Ok(())
}
