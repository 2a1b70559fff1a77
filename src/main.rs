use anyhow::Result;
use clap::Parser;
use pflog::{cli::Cli, launcher};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let existing_preload = std::env::var_os(launcher::PRELOAD_ENV_VAR);
    let plan = launcher::LaunchPlan::new(args, existing_preload)?;

    // exec only returns on failure
    Err(plan.exec())
}
