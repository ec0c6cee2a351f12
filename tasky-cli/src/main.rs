use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tasky_client::{ClientError, FileStorage, TaskyClient};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod render;
mod state;
mod tasks_cmd;

use auth::ProfileCommand;
use config::Config;
use tasks_cmd::TasksCommand;

#[derive(Parser, Debug)]
#[command(name = "tasky", version, about = "Tasky task manager CLI")]
struct Cli {
    /// Debug logging for tasky crates (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and keep the session in ~/.tasky
    Login {
        /// Email address or username (prompted when omitted)
        #[arg(long)]
        identifier: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },

    /// Forget the stored session
    Logout,

    /// Print the signed-in user
    Whoami,

    /// View or edit the account profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Change the account password (prompts for all three fields)
    Password,

    /// Task list commands
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },

    /// Manage ~/.tasky/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "tasky_cli=debug,tasky_client=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_client(cfg: &Config) -> Result<TaskyClient> {
    let dir = state::data_dir()?;
    let storage = FileStorage::new(&dir).with_context(|| format!("open {}", dir.display()))?;
    debug!(data_dir = %dir.display(), base_url = %cfg.api.base_url, "opening client");
    let client = TaskyClient::new(&cfg.api.base_url, cfg.timeout(), Arc::new(storage))?;
    Ok(client)
}

async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => config::show_config(),
        };
    }

    let cfg = config::load_config()?;
    let client = open_client(&cfg)?;

    let result = dispatch(&client, &cfg, cli.command).await;
    if result.as_ref().is_err_and(session_expired) {
        client.sign_out();
    }
    result
}

fn session_expired(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_unauthorized)
}

async fn dispatch(client: &TaskyClient, cfg: &Config, command: Command) -> Result<()> {
    match command {
        Command::Login { identifier } => auth::login(client, identifier).await?,
        Command::Register {
            first_name,
            last_name,
            username,
            email,
        } => auth::register(client, first_name, last_name, username, email).await?,
        Command::Logout => auth::logout(client),
        Command::Whoami => auth::whoami(client),
        Command::Profile { command } => auth::profile(client, command).await?,
        Command::Password => auth::change_password(client).await?,
        Command::Tasks { command } => tasks_cmd::run(client, cfg, command).await?,
        Command::Config { .. } => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        if session_expired(&e) {
            eprintln!("Session expired or invalid; sign in again with `tasky login`.");
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_flags_parse() {
        let cli = Cli::try_parse_from([
            "tasky", "tasks", "list", "--view", "upcoming", "--priority", "high", "--offline",
        ])
        .unwrap();
        match cli.command {
            Command::Tasks {
                command: TasksCommand::List { view, filters, offline },
            } => {
                assert_eq!(view, tasky_core::View::Upcoming);
                assert_eq!(filters.priority, Some(tasky_core::Priority::High));
                assert!(offline);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn only_unauthorized_counts_as_expired_session() {
        let expired = anyhow::Error::from(ClientError::Unauthorized).context("list tasks");
        assert!(session_expired(&expired));

        let other = anyhow::Error::from(ClientError::Api {
            status: 500,
            message: "down".into(),
        });
        assert!(!session_expired(&other));
        assert!(!session_expired(&anyhow::anyhow!("not signed in")));
    }

    #[test]
    fn profile_picture_takes_a_reference() {
        let cli = Cli::try_parse_from(["tasky", "profile", "picture", "https://cdn.example.com/me.png"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Profile {
                command: ProfileCommand::Picture { ref reference },
            } if reference == "https://cdn.example.com/me.png"
        ));
    }

    #[test]
    fn bad_due_date_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["tasky", "tasks", "add", "x", "--due", "soon"]).is_err());
    }
}
