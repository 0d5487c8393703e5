mod config;
mod explain;
mod ui;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{ConfigMerger, RunOverrides};
use fs_err as fs;
use pbifix_core::adapters::{
    AlwaysConfirm, FsCatalog, FsModelConnector, NeverConfirm, ScriptedSelector,
};
use pbifix_core::settings::RunSettings;
use pbifix_core::{Orchestrator, RunError};
use pbifix_fixers::{FixerSettings, Registry};
use pbifix_render::{render_change_log_json, render_change_log_md, render_change_log_text};
use pbifix_types::{ChangeLog, RunMode};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use ui::{Terminal, TerminalConfirmation, TerminalSelector};

#[derive(Debug, Parser)]
#[command(
    name = "pbifix",
    version,
    about = "Idempotent scan/fix batches for Power BI report layouts and semantic models."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a batch of fixers against one report and its semantic model.
    Run(RunArgs),
    /// List all available fixers in run order.
    ListFixers(ListFixersArgs),
    /// Explain what a fixer does and which layer it touches.
    Explain(ExplainArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Directory holding one folder per workspace (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    #[arg(long)]
    workspace: Option<String>,

    #[arg(long)]
    report: Option<String>,

    /// Page id or display name; report fixers run on every page when omitted.
    #[arg(long)]
    page: Option<String>,

    /// Fixer key, title or glob pattern (repeatable).
    #[arg(long = "fixer")]
    fixers: Vec<String>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Confirm semantic model changes without prompting.
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,

    /// Never prompt; unspecified selections are taken from pbifix.toml or left empty.
    #[arg(long, default_value_t = false)]
    no_input: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: LogFormat,

    /// Include diff previews of pending report changes.
    #[arg(long, default_value_t = false)]
    show_diff: bool,

    /// Also write the rendered change log to this file.
    #[arg(long)]
    out: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ListFixersArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Fixer key or title (e.g., "page-size", "Fix Pie Charts").
    fixer_key: String,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Fix,
    Scan,
    ScanFix,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fix => RunMode::Fix,
            ModeArg::Scan => RunMode::Scan,
            ModeArg::ScanFix => RunMode::ScanFix,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogFormat {
    Text,
    Markdown,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::ListFixers(args) => cmd_list_fixers(args).map(|()| ExitCode::SUCCESS),
        Command::Explain(args) => cmd_explain(args).map(|()| ExitCode::SUCCESS),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let root = args.root.clone();
    let file_config = config::load_or_default(&root).context("load pbifix.toml config")?;
    let merged = ConfigMerger::new(file_config).merge_run_args(RunOverrides {
        workspace: args.workspace.clone(),
        report: args.report.clone(),
        page: args.page.clone(),
        fixers: args.fixers.clone(),
        mode: args.mode.map(RunMode::from),
    });
    debug!("merged config: {:?}", merged);

    let settings = RunSettings {
        fixers: merged.fixers,
    };
    let mut orchestrator = Orchestrator::with_settings(
        &settings,
        FsCatalog::new(root.clone()),
        FsModelConnector::new(root),
    );

    let interactive = !args.no_input && std::io::stdin().is_terminal();
    let mut declined = NeverConfirm::default();
    let result = if interactive {
        // Selector and confirmation prompt through the same stdin lock.
        let terminal = Terminal::stdio();
        let mut selector = TerminalSelector::new(Rc::clone(&terminal));
        if args.yes {
            orchestrator.select_and_run(merged.request, &mut selector, &mut AlwaysConfirm)
        } else {
            let mut gate = TerminalConfirmation::new(terminal);
            orchestrator.select_and_run(merged.request, &mut selector, &mut gate)
        }
    } else {
        let mut selector = ScriptedSelector::default();
        if args.yes {
            orchestrator.select_and_run(merged.request, &mut selector, &mut AlwaysConfirm)
        } else {
            orchestrator.select_and_run(merged.request, &mut selector, &mut declined)
        }
    };

    match result {
        Ok(log) => {
            let rendered = render(&log, args.format, args.show_diff)?;
            print!("{rendered}");
            if let Some(out) = &args.out {
                fs::write(out, &rendered).with_context(|| format!("write {}", out))?;
                info!("wrote change log to {}", out);
            }
            if log.has_failures() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(err) => {
            error!("{err}");
            if !declined.asked.is_empty() {
                eprintln!("Re-run with --yes to confirm semantic model changes.");
            }
            Ok(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &RunError) -> ExitCode {
    ExitCode::from(err.exit_code())
}

fn render(log: &ChangeLog, format: LogFormat, show_diff: bool) -> anyhow::Result<String> {
    Ok(match format {
        LogFormat::Text => render_change_log_text(log, show_diff),
        LogFormat::Markdown => render_change_log_md(log, show_diff),
        LogFormat::Json => {
            let mut json = render_change_log_json(log)?;
            json.push('\n');
            json
        }
    })
}

fn builtin_registry() -> Registry {
    Registry::builtin(&FixerSettings::default())
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    let registry = builtin_registry();
    let Some(fixer) = registry.get(&args.fixer_key) else {
        let available = registry.keys().join(", ");
        anyhow::bail!(
            "Unknown fixer key: '{}'\n\nAvailable fixers: {}",
            args.fixer_key,
            available
        );
    };
    print!("{}", explain::render_explanation(&fixer.meta()));
    Ok(())
}

fn cmd_list_fixers(args: ListFixersArgs) -> anyhow::Result<()> {
    let registry = builtin_registry();
    match args.format {
        OutputFormat::Text => print!("{}", explain::render_fixer_table(&registry)),
        OutputFormat::Json => {
            let fixers = explain::fixer_table_json(&registry);
            println!("{}", serde_json::to_string_pretty(&fixers)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mode_values() {
        let cli = Cli::try_parse_from(["pbifix", "run", "--mode", "scan-fix", "--fixer", "a"])
            .unwrap();
        let Command::Run(args) = cli.cmd else {
            panic!("expected run");
        };
        assert!(matches!(args.mode, Some(ModeArg::ScanFix)));
        assert_eq!(args.fixers, vec!["a"]);
        assert!(Cli::try_parse_from(["pbifix", "run", "--mode", "sometimes"]).is_err());
    }
}
