use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use thiserror::Error;

use crate::package_manager::PackageManager;

/// Outcome of a single interactive prompt. Callers check it right after the
/// prompt returns; a cancellation ends the run cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompted<T> {
    Answered(T),
    Cancelled,
}

#[derive(Debug, Error)]
#[error("prompt failed: {0}")]
pub struct PromptError(#[from] dialoguer::Error);

pub trait Prompter {
    /// Pick one manager out of `choices`, which is never empty.
    fn select_package_manager(
        &mut self,
        choices: &[PackageManager],
    ) -> Result<Prompted<PackageManager>, PromptError>;

    fn confirm_install(&mut self, executable: &str) -> Result<Prompted<bool>, PromptError>;
}

static PROMPTING: AtomicBool = AtomicBool::new(false);

/// Keeps SIGINT from killing the process while a prompt is open. The
/// terminal layer turns Ctrl-C into an `Interrupted` read error, which
/// [`cancel_on_interrupt`] reports as a cancellation.
fn install_interrupt_handler() {
    let _ = ctrlc::set_handler(|| {
        if PROMPTING.load(Ordering::SeqCst) {
            return;
        }
        let _ = Term::stderr().show_cursor();
        std::process::exit(130);
    });
}

struct PromptGuard;

impl PromptGuard {
    fn open() -> Self {
        PROMPTING.store(true, Ordering::SeqCst);
        PromptGuard
    }
}

impl Drop for PromptGuard {
    fn drop(&mut self) {
        PROMPTING.store(false, Ordering::SeqCst);
    }
}

/// Esc, `q` and Ctrl-C all count as the user backing out.
pub(crate) fn cancel_on_interrupt<T>(
    answer: Result<Option<T>, dialoguer::Error>,
) -> Result<Prompted<T>, PromptError> {
    match answer {
        Ok(Some(value)) => Ok(Prompted::Answered(value)),
        Ok(None) => Ok(Prompted::Cancelled),
        Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => {
            // dialoguer leaves the cursor hidden when the read is interrupted
            let _ = Term::stderr().show_cursor();
            eprintln!();
            Ok(Prompted::Cancelled)
        }
        Err(err) => Err(err.into()),
    }
}

/// Prompts on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        install_interrupt_handler();
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn select_package_manager(
        &mut self,
        choices: &[PackageManager],
    ) -> Result<Prompted<PackageManager>, PromptError> {
        let labels: Vec<&str> = choices.iter().map(|pm| pm.as_str()).collect();
        let _guard = PromptGuard::open();
        let picked = Select::with_theme(&self.theme)
            .with_prompt("Which package manager does this project use?")
            .items(&labels)
            .default(0)
            .interact_opt();

        Ok(match cancel_on_interrupt(picked)? {
            Prompted::Answered(idx) => Prompted::Answered(choices[idx]),
            Prompted::Cancelled => Prompted::Cancelled,
        })
    }

    fn confirm_install(&mut self, executable: &str) -> Result<Prompted<bool>, PromptError> {
        let _guard = PromptGuard::open();
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Run `{executable} install` now?"))
            .default(true)
            .interact_opt();

        cancel_on_interrupt(answer)
    }
}


#[cfg(test)]
mod tests {
    use std::io;

    use super::{Prompted, cancel_on_interrupt};

    #[test]
    fn ctrl_c_counts_as_cancellation() {
        let interrupted = dialoguer::Error::IO(io::Error::new(
            io::ErrorKind::Interrupted,
            "read interrupted",
        ));
        let outcome = cancel_on_interrupt::<usize>(Err(interrupted)).expect("should not fail");
        assert_eq!(outcome, Prompted::Cancelled);
    }

    #[test]
    fn escape_counts_as_cancellation() {
        let outcome = cancel_on_interrupt::<bool>(Ok(None)).unwrap();
        assert_eq!(outcome, Prompted::Cancelled);
    }

    #[test]
    fn answers_pass_through() {
        assert_eq!(cancel_on_interrupt(Ok(Some(2usize))).unwrap(), Prompted::Answered(2));
    }

    #[test]
    fn other_terminal_errors_still_fail() {
        let broken = dialoguer::Error::IO(io::Error::new(io::ErrorKind::NotConnected, "no tty"));
        let err = cancel_on_interrupt::<bool>(Err(broken)).expect_err("should fail");
        assert!(err.to_string().contains("no tty"));
    }
}
