use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use taskmate::{CliError, Command, Context, Credentials};
use taskmate_db::{DEFAULT_DB_DIR, Database, TimeZone};

/// Environment variable name for the database path
const DB_PATH_ENV: &str = "TASKMATE_DB_PATH";

/// taskmate - A personal task tracker
#[derive(Parser)]
#[command(name = "tm")]
#[command(version = "0.1.0")]
#[command(about = "A personal task tracker", long_about = None)]
struct Args {
    /// Path to the database directory (can also be set via TASKMATE_DB_PATH env var)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Username to log in with
    #[arg(long, global = true, env = "TASKMATE_USER")]
    user: Option<String>,

    /// Password to log in (or register) with
    #[arg(long, global = true, env = "TASKMATE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Time zone that decides what "today" is (UTC, local, +HH:MM, or an IANA name)
    #[arg(long, global = true, env = "TASKMATE_TIME_ZONE", default_value = "UTC")]
    time_zone: TimeZone,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

/// Get the database path from command line, environment variable, or default.
///
/// Priority:
/// 1. Command line --db argument
/// 2. TASKMATE_DB_PATH environment variable (if non-empty)
/// 3. Default path (~/.taskmate/data)
fn resolve_db_path(cli_db: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db {
        return Ok(path);
    }

    if let Ok(env_path) = std::env::var(DB_PATH_ENV)
        && !env_path.is_empty()
    {
        return Ok(PathBuf::from(env_path));
    }

    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DB_DIR))
        .ok_or(CliError::NoHomeDirectory)
}

/// Initialize logging from `RUST_LOG`, defaulting to warnings only
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run_app().await {
        eprintln!("error: {}", e.full_message());
        process::exit(1);
    }
}

/// Main application logic - separated for testability
async fn run_app() -> Result<(), CliError> {
    let args = Args::parse();
    run_with_args(args).await
}

/// Run the application with the given arguments
async fn run_with_args(args: Args) -> Result<(), CliError> {
    let db_path = resolve_db_path(args.db)?;

    let db = Database::connect(&db_path).await?;
    db.init().await?;

    match &args.command {
        Some(cmd) => {
            let credentials = Credentials {
                username: args.user,
                password: args.password,
            };
            let ctx = Context::new(Arc::new(db), credentials, args.time_zone);
            let result = cmd.execute(&ctx).await?;
            println!("{}", result);
        }
        None => {
            println!("Welcome to taskmate!");
            println!("Use 'tm --help' for usage information.");
        }
    }

    Ok(())
}
