use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use runtime::{AppConfig, CliArgs};
use std::path::{Path, PathBuf};
use timesheet::contract::model::NewUser;
use timesheet::domain::activities::ActivityService;
use timesheet::domain::users::UserService;
use timesheet::{create_schema, TimesheetConfig};
use worktrack_db::{build_dsn, redact_credentials_in_dsn, ConnectOpts, DbConnConfig, DbHandle};

const SEED_ACTIVITY_TYPES: [&str; 3] = ["Projects", "Non Project Activities", "Leave"];

/// Placeholder hash that no password verifies against; seeded accounts must
/// set a password before they can log in.
const DISABLED_PASSWORD: &str = "!";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// In-memory DSNs are returned unchanged.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.contains(":memory:") || dsn.contains("mode=memory") {
        return Ok(dsn.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Worktrack - time-tracking backend administration
#[derive(Parser)]
#[command(name = "worktrack")]
#[command(about = "Worktrack - time-tracking backend administration")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print current configuration (credentials masked) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables and indexes
    InitDb,
    /// Create the schema, then insert the default accounts and activity types
    Seed,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // home_dir comes back absolute and created
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("worktrack starting");

    if cli.print_config {
        println!("{}", config.redacted().to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Check) {
        Commands::InitDb => init_db(&config).await,
        Commands::Seed => seed(&config).await,
        Commands::Check => check_config(&config),
    }
}

/// Final DSN for the configured database, sqlite paths anchored at home_dir.
fn resolve_dsn(config: &AppConfig) -> Result<(String, ConnectOpts)> {
    let db_config = config
        .database
        .clone()
        .unwrap_or_else(|| DbConnConfig {
            dsn: Some("sqlite://database/worktrack.db".to_string()),
            ..Default::default()
        });

    let mut dsn = build_dsn(&db_config).context("Invalid database configuration")?;
    if dsn.starts_with("sqlite:") {
        dsn = absolutize_sqlite_dsn(&dsn, Path::new(&config.server.home_dir))?;
    }
    let opts = db_config
        .pool
        .as_ref()
        .map(ConnectOpts::from)
        .unwrap_or_default();
    Ok((dsn, opts))
}

async fn connect(config: &AppConfig) -> Result<DbHandle> {
    let (dsn, opts) = resolve_dsn(config)?;
    tracing::info!(dsn = %redact_credentials_in_dsn(Some(&dsn)), "connecting to database");
    let db = DbHandle::connect(&dsn, opts).await?;
    tracing::info!(engine = ?db.engine(), "database connected");
    Ok(db)
}

async fn init_db(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    create_schema(&*db.sea()).await?;
    db.close().await;
    println!("Database schema is up to date");
    Ok(())
}

async fn seed(config: &AppConfig) -> Result<()> {
    let module_cfg: TimesheetConfig = config.module_config("timesheet")?;
    let db = connect(config).await?;
    create_schema(&*db.sea()).await?;

    let users = UserService::new();
    let activities = ActivityService::new(module_cfg);

    let accounts = [
        ("Administrator", "admin@example.com", true),
        ("Jason", "jason@example.com", false),
        ("James", "james@example.com", false),
    ];
    for (full_name, email, is_admin) in accounts {
        let session = db.session();
        let user = users
            .upsert_by_email(
                &session,
                NewUser {
                    full_name: full_name.to_string(),
                    email: email.to_string(),
                    hashed_password: DISABLED_PASSWORD.to_string(),
                    is_admin,
                    role: is_admin.then(|| "admin".to_string()),
                },
            )
            .await?;
        session.close().await?;
        tracing::info!(user_id = %user.id, email, "account seeded");
    }

    let session = db.session();
    let types = activities
        .ensure_activity_types(&session, &SEED_ACTIVITY_TYPES)
        .await?;
    session.close().await?;

    db.close().await;
    println!(
        "Seeded {} accounts and {} activity types",
        accounts.len(),
        types.len()
    );
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let _: TimesheetConfig = config.module_config("timesheet")?;
    let (dsn, _) = resolve_dsn(config)?;
    DbHandle::detect(&dsn)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.redacted().to_yaml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_sqlite_path_anchored_at_home() {
        let dsn = absolutize_sqlite_dsn("sqlite://database/app.db?mode=rwc", Path::new("/srv/wt"))
            .unwrap();
        assert_eq!(dsn, "sqlite:///srv/wt/database/app.db?mode=rwc");
    }

    #[test]
    fn test_absolute_and_memory_dsns_unchanged() {
        let dsn = absolutize_sqlite_dsn("sqlite:///var/lib/wt.db", Path::new("/srv/wt")).unwrap();
        assert_eq!(dsn, "sqlite:///var/lib/wt.db");
        let mem = absolutize_sqlite_dsn("sqlite::memory:", Path::new("/srv/wt")).unwrap();
        assert_eq!(mem, "sqlite::memory:");
    }

    #[test]
    fn test_empty_path_rejected() {
        assert!(absolutize_sqlite_dsn("sqlite://", Path::new("/srv")).is_err());
    }
}
