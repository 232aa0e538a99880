use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::installer::{Installer, ProcessInstaller};
use crate::manifest::Manifest;
use crate::overrides::apply_canary_overrides;
use crate::package_manager::resolve;
use crate::prompt::{Prompted, Prompter, TerminalPrompter};

pub const LOG_ENV: &str = "INSTALL_CANARY_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "install-canary",
    version,
    about = "Point a project's Vue packages at their canary builds"
)]
pub struct Cli {
    /// Package manager to use instead of detecting one
    #[arg(long, value_name = "NAME")]
    pub pm: Option<String>,
    /// Project directory containing package.json
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// How a run ended when nothing went fatally wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Completed,
    Cancelled,
    InstallFailed,
}

impl Exit {
    pub fn code(self) -> i32 {
        match self {
            Exit::Completed | Exit::Cancelled => 0,
            Exit::InstallFailed => 1,
        }
    }
}

pub fn run() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dir = match cli.cwd {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                eprintln!("error: resolving current directory: {err}");
                return 1;
            }
        },
    };

    match execute(
        cli.pm.as_deref(),
        &dir,
        &mut TerminalPrompter::new(),
        &mut ProcessInstaller,
    ) {
        Ok(exit) => exit.code(),
        Err(err) => {
            eprintln!("{} {err:#}", console::style("error:").red().bold());
            1
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();
}

/// Loads the manifest, picks a package manager, writes the canary
/// overrides and optionally installs.
pub fn execute(
    explicit_pm: Option<&str>,
    dir: &Path,
    prompter: &mut dyn Prompter,
    installer: &mut dyn Installer,
) -> anyhow::Result<Exit> {
    let mut manifest = Manifest::load(dir)?;

    let resolution = match resolve(explicit_pm, &manifest, dir, prompter)
        .context("choosing a package manager")?
    {
        Prompted::Answered(resolution) => resolution,
        Prompted::Cancelled => return Ok(cancelled()),
    };

    let field = apply_canary_overrides(&mut manifest, resolution.manager);
    manifest.save()?;
    info!("updated {field} in {}", manifest.path().display());

    match prompter
        .confirm_install(&resolution.executable)
        .context("confirming install")?
    {
        Prompted::Answered(true) => {}
        Prompted::Answered(false) => return Ok(Exit::Completed),
        Prompted::Cancelled => return Ok(cancelled()),
    }

    if let Err(err) = installer.install(&resolution.executable, dir) {
        eprintln!("{}", err.diagnostic());
        return Ok(Exit::InstallFailed);
    }

    println!("{}", console::style("Canary packages installed.").green());
    Ok(Exit::Completed)
}

fn cancelled() -> Exit {
    println!("{}", console::style("Operation cancelled.").yellow());
    Exit::Cancelled
}
