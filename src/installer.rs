use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::debug;
use which::which;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to start `{program} install`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program} install` exited with {status}")]
    Failed {
        program: String,
        status: ExitStatus,
        output: String,
    },
}

impl InstallError {
    /// What the user sees after a failed install: the captured output, or a
    /// generic line when the process printed nothing.
    pub fn diagnostic(&self) -> String {
        match self {
            InstallError::Spawn { source, .. } => format!("{self}: {source}"),
            InstallError::Failed { output, .. } if !output.trim().is_empty() => output.clone(),
            InstallError::Failed { .. } => format!("install failed ({self})"),
        }
    }
}

pub trait Installer {
    fn install(&mut self, executable: &str, dir: &Path) -> Result<(), InstallError>;
}

/// Runs `<executable> install` with captured output behind a spinner.
#[derive(Debug, Default)]
pub struct ProcessInstaller;

impl Installer for ProcessInstaller {
    fn install(&mut self, executable: &str, dir: &Path) -> Result<(), InstallError> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .expect("valid template")
                .tick_chars("|/-\\ "),
        );
        pb.set_message(format!("installing canary packages with {executable}"));
        pb.enable_steady_tick(Duration::from_millis(100));

        let result = run_install(executable, dir);

        pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
        let summary = match &result {
            Ok(()) => console::style(format!("{executable} install succeeded")).green(),
            Err(_) => console::style(format!("{executable} install failed")).red(),
        };
        pb.finish_with_message(summary.to_string());
        result
    }
}

pub fn run_install(executable: &str, dir: &Path) -> Result<(), InstallError> {
    let program = resolve_program(executable);
    debug!("spawning {} install in {}", program.display(), dir.display());

    let output = Command::new(&program)
        .arg("install")
        .current_dir(dir)
        .output()
        .map_err(|source| InstallError::Spawn {
            program: executable.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(InstallError::Failed {
        program: executable.to_string(),
        status: output.status,
        output: captured_output(&output),
    })
}

fn resolve_program(executable: &str) -> PathBuf {
    which(executable).unwrap_or_else(|_| PathBuf::from(executable))
}

fn captured_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.into_owned();
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}
