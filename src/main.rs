//! Manus launcher CLI
//!
//! Entry point for the `manus-launch` command-line tool.

use clap::{Args, Parser, Subcommand};
use manus_launcher::config::{ensure_config, ConfigLocation, LocateOutcome};
use manus_launcher::credentials::check_credentials;
use manus_launcher::launch::{self, prepare_config, DEFAULT_ENTRY, DEFAULT_INTERPRETER};
use manus_launcher::signal::install_handler;
use manus_launcher::{
    AppSettings, ConfigStore, LaunchOptions, LauncherError, ProcessEnv, ShutdownToken,
    ENV_BINDINGS,
};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "manus-launch")]
#[command(about = "Prepare the Manus config and run the MCP server", version)]
struct Cli {
    /// Project root containing config/ and the server entry point
    #[arg(long, global = true, env = "MANUS_ROOT")]
    root: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Defaults to `launch`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare the config and run the server (default)
    Launch(LaunchArgs),

    /// Seed the config, apply environment overrides and backfill defaults
    Sync,

    /// Print a config section (or all sections) as JSON
    Get {
        /// Section name, e.g. `llm` or `browser`
        section: Option<String>,
    },

    /// Set config values, e.g. `llm.model=gpt-4o`
    Set {
        #[arg(required = true, value_name = "PATH=VALUE")]
        assignments: Vec<String>,
    },

    /// Print the config as environment variable assignments
    Env {
        /// Print secrets instead of redacting them
        #[arg(long)]
        show_secrets: bool,
    },

    /// Validate the config and the LLM credentials
    Check,
}

#[derive(Args, Debug)]
struct LaunchArgs {
    /// Python interpreter used to run the server
    #[arg(long = "python", env = "MANUS_PYTHON")]
    python: Option<String>,

    /// Server entry script, relative to the root
    #[arg(long, env = "MANUS_ENTRY")]
    entry: Option<PathBuf>,

    /// Run `pip install -r requirements.txt` before starting
    #[arg(long)]
    install_deps: bool,

    /// Arguments passed to the server (after --)
    #[arg(last = true)]
    args: Vec<String>,
}

/// Bare `launch` arguments, used when no subcommand is given.
#[derive(Parser)]
#[command(name = "manus-launch")]
struct DefaultLaunch {
    #[command(flatten)]
    launch: LaunchArgs,
}

impl LaunchArgs {
    /// Values a bare `launch` would get, including `MANUS_*` fallbacks.
    fn from_env() -> Self {
        DefaultLaunch::parse_from(["manus-launch"]).launch
    }

    fn into_options(self, root: PathBuf) -> LaunchOptions {
        let mut opts = LaunchOptions::new(root);
        opts.interpreter = self
            .python
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string());
        opts.entry = self.entry.unwrap_or_else(|| PathBuf::from(DEFAULT_ENTRY));
        opts.install_deps = self.install_deps;
        opts.args = self.args;
        opts
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let result = match cli.command {
        None => run_launch(LaunchArgs::from_env(), root),
        Some(Commands::Launch(args)) => run_launch(args, root),
        Some(Commands::Sync) => run_sync(root),
        Some(Commands::Get { section }) => run_get(root, section),
        Some(Commands::Set { assignments }) => run_set(root, &assignments),
        Some(Commands::Env { show_secrets }) => run_env(root, show_secrets),
        Some(Commands::Check) => run_check(root),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_launch(args: LaunchArgs, root: PathBuf) -> Result<i32, LauncherError> {
    let opts = args.into_options(root);
    let token = ShutdownToken::new();
    install_handler(&token)?;
    Ok(launch::launch(&opts, &ProcessEnv, &token)?)
}

fn run_sync(root: PathBuf) -> Result<i32, LauncherError> {
    let prepared = prepare_config(&root, &ProcessEnv)?;

    let outcome = match prepared.location.outcome {
        LocateOutcome::Existing => "existing",
        LocateOutcome::Seeded => "seeded from template",
        LocateOutcome::Missing => "missing",
    };
    println!("Config: {} ({})", prepared.location.active.display(), outcome);

    for applied in &prepared.sync.applied {
        let status = if applied.outcome.is_skipped() {
            "skipped"
        } else {
            "applied"
        };
        println!("  {} -> {} ({})", applied.var, applied.path, status);
    }
    for report in &prepared.backfill {
        for path in &report.added {
            println!("  default added: {}", path);
        }
        for finding in &report.findings {
            println!("  warning: {}", finding);
        }
    }

    Ok(0)
}

fn run_get(root: PathBuf, section: Option<String>) -> Result<i32, LauncherError> {
    let store = ConfigStore::new(ConfigLocation::for_root(&root).active);

    let json = match section {
        Some(name) => match store.read_section(&name) {
            Some(view) => serde_json::to_string_pretty(&view)?,
            None => {
                error!("section '{}' not found", name);
                return Ok(1);
            }
        },
        None => {
            let sections: serde_json::Map<String, serde_json::Value> = store
                .sections()?
                .into_iter()
                .map(|(name, body)| (name, serde_json::Value::String(body)))
                .collect();
            serde_json::to_string_pretty(&sections)?
        }
    };

    println!("{}", json);
    Ok(0)
}

fn run_set(root: PathBuf, assignments: &[String]) -> Result<i32, LauncherError> {
    let updates = assignments
        .iter()
        .map(|a| {
            a.split_once('=')
                .filter(|(path, _)| !path.trim().is_empty())
                .map(|(path, value)| (path.trim(), value))
                .ok_or_else(|| LauncherError::InvalidAssignment(a.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let location = ensure_config(&root)?;
    let report = ConfigStore::new(&location.active).update(&updates)?;

    let mut skipped = 0;
    for (path, outcome) in &report.outcomes {
        if outcome.is_skipped() {
            skipped += 1;
        }
        println!("{}: {:?}", path, outcome);
    }

    Ok(if skipped > 0 { 1 } else { 0 })
}

fn run_env(root: PathBuf, show_secrets: bool) -> Result<i32, LauncherError> {
    let store = ConfigStore::new(ConfigLocation::for_root(&root).active);
    for (name, value) in store.export_env_vars(ENV_BINDINGS, !show_secrets)? {
        println!("{}={}", name, value);
    }
    Ok(0)
}

fn run_check(root: PathBuf) -> Result<i32, LauncherError> {
    let location = ConfigLocation::for_root(&root);
    let settings = AppSettings::load(&location.active)?;
    let llm = settings.default_llm();
    check_credentials(&llm)?;

    println!(
        "Configuration valid: {} (model {}, api_type {})",
        location.active.display(),
        llm.model,
        llm.api_type
    );
    Ok(0)
}
