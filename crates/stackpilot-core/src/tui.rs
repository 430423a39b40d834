//! Interactive setup workflow (cliclack-based)

use crate::probes::EndpointValidator;
use crate::prompt::CliclackPrompter;
use crate::setup::{self, SetupArgs};
use anyhow::Result;

/// Run the full setup behind cliclack prompts and messaging.
pub fn run_setup(args: SetupArgs) -> Result<()> {
    cliclack::intro("stackpilot setup")?;
    if !args.config_path.exists() {
        cliclack::log::info("No existing configuration found, starting fresh")?;
    }

    let mut prompter = CliclackPrompter;
    let validator = EndpointValidator;
    let outcome = setup::run_with(&args, &mut prompter, &validator)?;

    cliclack::log::success(format!(
        "Configuration saved to {}",
        args.config_path.display()
    ))?;
    cliclack::log::success(format!(
        "Rendered {} files into {}",
        outcome.written.len(),
        args.env_dir.display()
    ))?;
    if let Some(path) = outcome.trigger {
        cliclack::log::info(format!(
            "Database credentials changed; wrote {} for the next start",
            path.display()
        ))?;
    }

    cliclack::outro("Setup complete. Run `stackpilot start` to bring the stack up.")?;
    Ok(())
}
