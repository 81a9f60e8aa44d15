//! Command-line interface parsing and handling
//!
//! Every subcommand other than `config` and `connect-url` talks to the
//! workspace service through the same state container and desk loop as the
//! interactive shell.

pub mod config_cmd;
pub mod prompt;
pub mod render;
pub mod session;
pub mod shell;
pub mod workspace;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::{auth_start_url, WorkspaceClient};
use crate::core::config::data::BASE_URL_ENV;
use crate::core::config::Config;
use crate::logging::init_logging;

#[derive(Parser)]
#[command(name = "crewdesk")]
#[command(about = "Terminal client for a multi-agent project workspace")]
#[command(
    long_about = "crewdesk mirrors a remote project workspace: a roster of agents, a set of \
projects, and a per-project message log shared by every agent.\n\n\
Run without a subcommand to open the interactive shell.\n\n\
Environment Variables:\n\
  CREWDESK_BASE_URL   Service root, e.g. https://desk.example.com/api\n\
  CREWDESK_LOG        Log filter directives (default: info)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Service root URL (overrides CREWDESK_BASE_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Email used when a login is needed (overrides login-email)
    #[arg(short = 'e', long, global = true)]
    pub email: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive shell (default)
    Shell,
    /// Show session, storage connectivity and load states
    Status,
    /// Sign in; the password is read from stdin
    Login,
    /// List the agent roster
    Agents,
    /// Show an agent's profile
    Profile {
        /// Agent id
        agent: String,
    },
    /// List projects
    Projects,
    /// Create a project
    Create {
        /// Project name (may be several words)
        #[arg(required = true, trailing_var_arg = true)]
        name: Vec<String>,
    },
    /// Delete a project
    Delete {
        /// Project id
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Print a project's messages for one agent
    Chat {
        /// Project id
        project: String,
        /// Agent id (defaults to the first agent in the roster)
        #[arg(short = 'a', long)]
        agent: Option<String>,
    },
    /// Send a message to an agent and print the reply
    Send {
        /// Project id
        project: String,
        /// Agent id
        agent: String,
        /// Message text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Print the URL that starts the storage connect flow
    ConnectUrl {
        /// Origin to come back to once connected
        #[arg(long, default_value = "http://localhost:8788")]
        return_to: String,
    },
    /// Show or edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// One of: base-url, login-email, greeting, log-file
        key: String,
        /// Value (may be several words)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// One of: base-url, login-email, greeting, log-file, agents
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::load()?;

    let log_file = args.log.clone().or_else(|| config.log_file.clone());
    init_logging(log_file.as_deref().map(Path::new))?;

    let env_base_url = std::env::var(BASE_URL_ENV).ok();
    let base_url = config.resolve_base_url(args.base_url.as_deref(), env_base_url.as_deref());

    let command = args.command.unwrap_or(Commands::Shell);
    match command {
        Commands::Config { command } => config_cmd::run(config, command),
        Commands::ConnectUrl { return_to } => {
            println!("{}", auth_start_url(&base_url, &return_to)?);
            Ok(())
        }
        Commands::Shell => {
            let backend = Arc::new(WorkspaceClient::new(&base_url)?);
            shell::run_shell(backend, &config, args.email).await
        }
        command => {
            let backend = Arc::new(WorkspaceClient::new(&base_url)?);
            workspace::run(backend, &config, args.email, command).await
        }
    }
}
