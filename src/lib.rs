pub mod cli;
pub mod installer;
pub mod manifest;
pub mod overrides;
pub mod package_manager;
pub mod prompt;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    cli::run()
}
