mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cs")]
#[command(version, about = "Inventory of systemd units and Docker Compose stacks")]
struct Args {
    /// Stack definition file (default: $COMPOSE_STACK_CONFIG or ~/compose-stack.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More output, repeat for more (-vvv shows debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List declared and running services
    #[command(visible_alias = "ps")]
    Services(commands::ServicesArgs),

    /// List docker images and volumes
    Ls,

    /// Print the stack definition
    Config {
        /// Print an example definition instead
        #[arg(short, long)]
        template: bool,
    },

    /// Check that docker and systemctl are usable
    Check,

    /// Stop a service
    Stop {
        /// Service name
        name: String,

        /// Stack the service belongs to
        #[arg(long)]
        stack: Option<String>,
    },

    /// Restart a running service
    Restart {
        /// Service name
        name: String,

        /// Stack the service belongs to
        #[arg(long)]
        stack: Option<String>,

        /// Restart even if the service is not running
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    compose_stack::logging::init(args.verbose);

    let config = args.config.as_deref();
    let result = match args.command {
        Command::Services(opts) => commands::services(config, &opts),
        Command::Ls => commands::ls(),
        Command::Config { template } => commands::config(config, template),
        Command::Check => commands::check(),
        Command::Stop { name, stack } => commands::stop(config, &name, stack.as_deref()),
        Command::Restart { name, stack, force } => {
            commands::restart(config, &name, stack.as_deref(), force)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
