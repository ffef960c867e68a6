//! CreditScore session CLI.
//!
//! Inspect and change the locally persisted login session of the
//! CreditScore client from the command line.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use creditscore_core::{Config, Credentials, SessionHandle, SessionProvider, StorageBackend};

/// CreditScore session manager
#[derive(Parser, Debug)]
#[command(name = "creditscore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CREDITSCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend (memory, file, keyring)
    #[arg(long, global = true, env = "CREDITSCORE_BACKEND")]
    backend: Option<StorageBackend>,

    /// Directory for file storage
    #[arg(long, global = true, env = "CREDITSCORE_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show whether a session is active
    Status {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a token obtained from the login endpoint
    Login(LoginArgs),

    /// Forget the current session
    Logout,

    /// Print the logged-in username
    Whoami,
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Display name of the user
    #[arg(short, long)]
    username: String,

    /// Session token; prompted for when omitted
    #[arg(short, long, env = "CREDITSCORE_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v when set
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }),
    };

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    debug!(backend = %config.backend, data_dir = ?config.data_dir, "Config loaded");
    Ok(config)
}

fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let storage = config
        .open_storage()
        .context("Failed to open session storage")?;

    let provider = SessionProvider::new(storage);
    let session = provider.handle();

    let mut stdout = io::stdout().lock();
    let code = match cli.command {
        Commands::Status { json } => {
            status(&mut stdout, &session, json, provider.is_persistent())?;
            ExitCode::SUCCESS
        }
        Commands::Login(args) => {
            login(&mut stdout, &session, args)?;
            ExitCode::SUCCESS
        }
        Commands::Logout => {
            session.logout()?;
            writeln!(stdout, "Logged out")?;
            ExitCode::SUCCESS
        }
        Commands::Whoami => {
            if whoami(&mut stdout, &session)? {
                ExitCode::SUCCESS
            } else {
                eprintln!("Not logged in");
                ExitCode::FAILURE
            }
        }
    };

    if !provider.is_persistent() {
        warn!("Session storage was unavailable; changes were not saved");
    }
    Ok(code)
}

fn status(out: &mut impl Write, session: &SessionHandle, json: bool, persistent: bool) -> Result<()> {
    let snapshot = session.snapshot()?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        return Ok(());
    }

    let mut line = match snapshot.username {
        Some(ref username) if snapshot.is_authenticated => format!("authenticated as {}", username),
        _ => "anonymous".to_string(),
    };
    if !persistent {
        line.push_str(" (memory-only)");
    }
    writeln!(out, "{}", line)?;
    Ok(())
}

/// Print the username; false when nobody is logged in
fn whoami(out: &mut impl Write, session: &SessionHandle) -> Result<bool> {
    match session.username()? {
        Some(username) => {
            writeln!(out, "{}", username)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn login(out: &mut impl Write, session: &SessionHandle, args: LoginArgs) -> Result<()> {
    let token = match args.token {
        Some(token) => token,
        None => rpassword::prompt_password("Token: ").context("Failed to read token")?,
    };

    let credentials = Credentials::new(token, args.username)?;
    info!(username = credentials.username(), "Storing session");
    session.login(credentials)?;

    let username = session.username()?.unwrap_or_default();
    writeln!(out, "Logged in as {}", username)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditscore_core::{KeyValueStore, StorageError};

    #[test]
    fn test_cli_parses_login() {
        let cli = Cli::try_parse_from([
            "creditscore",
            "--backend",
            "memory",
            "login",
            "--username",
            "alice",
            "--token",
            "abc",
        ])
        .unwrap();

        assert_eq!(cli.backend, Some(StorageBackend::Memory));
        match cli.command {
            Commands::Login(args) => {
                assert_eq!(args.username, "alice");
                assert_eq!(args.token.as_deref(), Some("abc"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_backend() {
        let result = Cli::try_parse_from(["creditscore", "--backend", "redis", "status"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbosity_counts() {
        let cli = Cli::try_parse_from(["creditscore", "-vv", "status", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Status { json: true }));
    }

    // -------------------------------------------------------------------------
    // Command output
    // -------------------------------------------------------------------------

    /// Storage that refuses every operation, as with storage disabled
    struct DisabledStorage;

    impl KeyValueStore for DisabledStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    fn memory_provider() -> SessionProvider {
        let config = Config {
            backend: StorageBackend::Memory,
            data_dir: None,
        };
        SessionProvider::new(config.open_storage().unwrap())
    }

    fn login_args(username: &str, token: &str) -> LoginArgs {
        LoginArgs {
            username: username.to_string(),
            token: Some(token.to_string()),
        }
    }

    fn status_line(provider: &SessionProvider, json: bool) -> String {
        let mut out = Vec::new();
        status(&mut out, &provider.handle(), json, provider.is_persistent()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_status_anonymous() {
        let provider = memory_provider();
        assert_eq!(status_line(&provider, false), "anonymous\n");
    }

    #[test]
    fn test_status_authenticated() {
        let provider = memory_provider();
        login(&mut Vec::new(), &provider.handle(), login_args("alice", "abc")).unwrap();

        assert_eq!(status_line(&provider, false), "authenticated as alice\n");
    }

    #[test]
    fn test_status_json() {
        let provider = memory_provider();
        login(&mut Vec::new(), &provider.handle(), login_args("alice", "abc")).unwrap();

        let json: serde_json::Value = serde_json::from_str(&status_line(&provider, true)).unwrap();
        assert_eq!(json["isAuthenticated"], true);
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_status_memory_only() {
        let storage: Box<dyn KeyValueStore> = Box::new(DisabledStorage);
        let provider = SessionProvider::new(storage);
        assert!(!provider.is_persistent());
        assert_eq!(status_line(&provider, false), "anonymous (memory-only)\n");

        login(&mut Vec::new(), &provider.handle(), login_args("alice", "abc")).unwrap();
        assert_eq!(status_line(&provider, false), "authenticated as alice (memory-only)\n");
    }

    #[test]
    fn test_whoami_anonymous_fails() {
        let provider = memory_provider();
        let mut out = Vec::new();

        assert!(!whoami(&mut out, &provider.handle()).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_whoami_prints_username() {
        let provider = memory_provider();
        login(&mut Vec::new(), &provider.handle(), login_args("alice", "abc")).unwrap();

        let mut out = Vec::new();
        assert!(whoami(&mut out, &provider.handle()).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "alice\n");
    }

    #[test]
    fn test_login_through_handle() {
        let provider = memory_provider();
        let session = provider.handle();

        let mut out = Vec::new();
        login(&mut out, &session, login_args("alice", "abc")).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Logged in as alice\n");
        assert_eq!(session.username().unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn test_login_rejects_blank_token() {
        let provider = memory_provider();
        let result = login(&mut Vec::new(), &provider.handle(), login_args("alice", "  "));

        assert!(result.is_err());
        assert!(!provider.snapshot().is_authenticated);
    }
}
