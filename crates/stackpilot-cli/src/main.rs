use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use stackpilot_core::compose::{self, Stack};
use stackpilot_core::prompt::CliclackPrompter;
use stackpilot_core::{readiness, resolver, ConfigStore, SetupArgs};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "stackpilot")]
#[command(about = "Interactive installer and operator for a multi-container web stack")]
#[command(version)]
pub struct Args {
    /// Persisted configuration file
    #[arg(long, default_value = ".stackpilot/installation.json", global = true)]
    pub config: PathBuf,

    /// Template source directory
    #[arg(long, default_value = "templates", global = true)]
    pub templates: PathBuf,

    /// Destination for rendered environment files
    #[arg(long = "env-dir", default_value = ".stackpilot/env", global = true)]
    pub env_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configure the installation and render its artifacts
    Setup {
        /// Overwrite artifacts of a different lineage without asking
        #[arg(long)]
        force: bool,
    },
    /// Start the stacks for this server's role
    Start,
    /// Stop the stacks for this server's role
    Stop,
    /// Restart the stacks for this server's role
    Restart,
    /// Build or rebuild service images
    Build,
    /// Pull newer images and restart on them
    Upgrade,
    /// Tail service logs
    Logs,
    /// Show service status
    Status,
    /// Put the front end into or out of maintenance mode
    Maintenance {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully: nothing unsaved survives an interrupt
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let result = dispatch(args).await;
    let _ = console::Term::stderr().show_cursor();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_fatal(&e);
            ExitCode::FAILURE
        }
    }
}

fn print_fatal(e: &anyhow::Error) {
    let bar = "=".repeat(60);
    eprintln!("{}", bar.red());
    eprintln!("{}", "  ERROR".red().bold());
    for line in format!("{:#}", e).lines() {
        eprintln!("  {}", line.red());
    }
    eprintln!("{}", bar.red());
}

async fn dispatch(mut args: Args) -> Result<()> {
    // No subcommand defaults to interactive setup.
    let command = args
        .command
        .take()
        .unwrap_or(Command::Setup { force: false });

    match command {
        Command::Setup { force } => stackpilot_core::run_setup(SetupArgs {
            config_path: args.config.clone(),
            template_dir: args.templates.clone(),
            env_dir: args.env_dir.clone(),
            force,
        }),
        Command::Start => start(&args).await,
        Command::Stop => run_for_role(&args, &["down"]).await,
        Command::Restart => run_for_role(&args, &["restart"]).await,
        Command::Build => run_for_role(&args, &["build", "--pull"]).await,
        Command::Upgrade => upgrade(&args).await,
        Command::Logs => run_for_role(&args, &["logs", "--tail", "200"]).await,
        Command::Status => run_for_role(&args, &["ps"]).await,
        Command::Maintenance { state } => maintenance(&args, state == "on").await,
    }
}

/// Load the persisted configuration or explain that setup must run first.
fn load_configured(args: &Args) -> Result<stackpilot_core::ConfigDocument> {
    let mut store = ConfigStore::new(&args.config);
    let doc = store.load();
    if store.first_run() {
        anyhow::bail!(
            "No configuration found at {}. Run `stackpilot setup` first.",
            args.config.display()
        );
    }
    Ok(doc)
}

/// Run one compose subcommand against every stack this role owns.
async fn run_for_role(args: &Args, subcommand: &[&str]) -> Result<()> {
    let doc = load_configured(args)?;
    for stack in compose::stacks_for_role(&doc) {
        let invocation = compose::invocation(&doc, &args.env_dir, stack, subcommand);
        compose::run(&invocation).await?;
    }
    Ok(())
}

async fn start(args: &Args) -> Result<()> {
    let doc = load_configured(args)?;
    for stack in compose::stacks_for_role(&doc) {
        let invocation = compose::invocation(&doc, &args.env_dir, stack, &["up", "-d"]);
        compose::run(&invocation).await?;
    }

    // Only roles that serve the front end wait for it to answer.
    if matches!(
        resolver::role(&doc),
        resolver::Role::Single | resolver::Role::Frontend
    ) {
        let restart = compose::invocation(&doc, &args.env_dir, Stack::Frontend, &["restart"]);
        let mut prompter = CliclackPrompter;
        match readiness::wait_for_frontend(&doc, &restart, &mut prompter).await? {
            readiness::Readiness::Healthy => {
                println!("{}", "Front end is up and healthy.".green());
            }
            readiness::Readiness::GaveUp => {
                println!(
                    "{}",
                    "Front end did not come up; check `stackpilot logs`.".yellow()
                );
            }
        }
    }

    Ok(())
}

async fn upgrade(args: &Args) -> Result<()> {
    let doc = load_configured(args)?;
    for stack in compose::stacks_for_role(&doc) {
        for subcommand in [&["pull"][..], &["up", "-d", "--build"][..]] {
            let invocation = compose::invocation(&doc, &args.env_dir, stack, subcommand);
            compose::run(&invocation).await?;
        }
    }
    Ok(())
}

async fn maintenance(args: &Args, on: bool) -> Result<()> {
    let mut store = ConfigStore::new(&args.config);
    let mut doc = store.load();
    if store.first_run() {
        anyhow::bail!(
            "No configuration found at {}. Run `stackpilot setup` first.",
            args.config.display()
        );
    }

    doc.set_bool("maintenance_mode", on);
    store.save(&doc)?;

    let (maintenance_cmd, frontend_cmd): (&[&str], &[&str]) = if on {
        (&["up", "-d"], &["stop"])
    } else {
        (&["down"], &["start"])
    };

    let frontend = compose::invocation(&doc, &args.env_dir, Stack::Frontend, frontend_cmd);
    let maint = compose::invocation(&doc, &args.env_dir, Stack::Maintenance, maintenance_cmd);

    if on {
        compose::run(&maint).await?;
        compose::run(&frontend).await?;
        println!("{}", "Maintenance mode is on.".yellow());
    } else {
        compose::run(&frontend).await?;
        compose::run(&maint).await?;
        println!("{}", "Maintenance mode is off.".green());
    }

    Ok(())
}
