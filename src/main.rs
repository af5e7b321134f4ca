use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use ledger_patcher::{
    builtin, load_from_path, MatchMode, PatchOutcome, PatchReport, Patcher, RuleOutcome, RuleSet,
    WorkspaceGuard,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ledger-patcher")]
#[command(
    about = "Apply literal-replacement patches to the WCM ledger grid component",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// File to patch, relative to the workspace (defaults to the rule set's target)
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// TOML rule file to use instead of the built-in rules
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Directory relative targets resolve against (defaults to the current directory)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Dry run - show what would change without modifying the file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Require every rule to match exactly once; otherwise write nothing
    #[arg(long)]
    strict: bool,

    /// Print a per-rule summary
    #[arg(short, long)]
    summary: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cmd_patch(cli)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_rule_set(rules: Option<&Path>) -> Result<RuleSet> {
    match rules {
        Some(path) => Ok(load_from_path(path)?),
        None => Ok(builtin::wcm_ledger_grid()),
    }
}

fn cmd_patch(cli: Cli) -> Result<()> {
    let rule_set = load_rule_set(cli.rules.as_deref())?;

    let workspace = match cli.workspace {
        Some(path) => path,
        None => env::current_dir().context("could not determine current directory")?,
    };
    let guard = WorkspaceGuard::new(&workspace)
        .with_context(|| format!("invalid workspace {}", workspace.display()))?;

    let target = cli.target.unwrap_or_else(|| PathBuf::from(rule_set.target()));

    let mode = if cli.strict {
        MatchMode::Strict
    } else {
        MatchMode::Lenient
    };

    let report = Patcher::new(target, rule_set.rules.clone())
        .mode(mode)
        .dry_run(cli.dry_run)
        .with_guard(guard)
        .run()?;

    if cli.summary || cli.dry_run {
        print_summary(&rule_set, &report);
    }

    if cli.diff && !report.plan.is_unchanged() {
        display_diff(report.outcome.file(), &report.plan.original, &report.plan.patched);
    }

    match &report.outcome {
        PatchOutcome::DryRun { .. } => {
            println!("{}", "[DRY RUN - no files were modified]".cyan());
        }
        PatchOutcome::Written { .. } | PatchOutcome::Unchanged { .. } => {
            if let Some(message) = rule_set.completion_message() {
                println!("{message}");
            }
        }
    }

    Ok(())
}

fn print_summary(rule_set: &RuleSet, report: &PatchReport) {
    if !rule_set.meta.name.is_empty() {
        println!("Rule set: {}", rule_set.meta.name);
    }
    println!("Target: {}", report.outcome.file().display());
    println!();

    for rule in &report.plan.rules {
        match rule.outcome {
            RuleOutcome::Replaced { count: 1 } => {
                println!("{} {}: {}", "✓".green(), rule.id, rule.outcome);
            }
            RuleOutcome::Replaced { .. } => {
                println!(
                    "{} {}: {} (expected 1)",
                    "⚠".yellow(),
                    rule.id,
                    rule.outcome
                );
            }
            RuleOutcome::NoMatch => {
                println!("{} {}: {}", "⊙".yellow(), rule.id, rule.outcome);
                if let Some(hint) = &rule.near_miss {
                    println!("  {}", hint.to_string().dimmed());
                }
            }
        }
    }

    println!();
    match &report.outcome {
        PatchOutcome::Written { bytes_written, .. } => {
            println!("{} ({} bytes written)", "Applied".green().bold(), bytes_written)
        }
        PatchOutcome::Unchanged { .. } => println!("{}", "Unchanged".yellow().bold()),
        PatchOutcome::DryRun { .. } => println!("{}", "Would apply".cyan().bold()),
    }
}

/// Show unified diff between original and patched content
fn display_diff(file: &Path, original: &str, patched: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, patched);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red(),
                ChangeTag::Insert => format!("+{}", change).green(),
                ChangeTag::Equal => format!(" {}", change).normal(),
            };
            print!("{}", line);
            if change.missing_newline() {
                println!();
            }
        }
    }
}
