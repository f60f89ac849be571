#![cfg_attr(
    not(any(feature = "pg", feature = "sqlite")),
    allow(unused_imports, unused_variables, dead_code, unreachable_code)
)]

//! Worktrack database layer.
//!
//! - [`DbHandle`]: pooled connection to PostgreSQL or SQLite, exposed as a SeaORM
//!   `DatabaseConnection`.
//! - [`DbSession`]: request-scoped unit of work with a lazily-begun transaction.
//! - [`Repository`]: generic create/read/update/upsert/delete over any entity that
//!   implements [`Resource`].
//! - [`PaginationFactory`]: binds `page`/`size`/`sort_by`/`filter_by` to an
//!   entity's allowed fields and compiles them into SeaORM expressions.
//!
//! # Features
//! - `pg`, `sqlite`: enable the SQLx backends (both on by default)
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> worktrack_db::Result<()> {
//!     use worktrack_db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//!     let session = db.session();
//!     // repositories take `&session`
//!     session.close().await?;
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod options;
pub mod query;
pub mod repo;
pub mod session;

pub use config::{DbConnConfig, PoolCfg};
pub use error::{RepoError, RepoResult};
pub use options::{build_dsn, redact_credentials_in_dsn};
pub use query::{Field, FieldMap, PaginationFactory, PaginationQuery, QuerySchema};
pub use repo::{Criteria, Lookup, OnConflictMode, Payload, Repository, Resource, UpsertOptions};
pub use session::DbSession;

pub use query_core::{FieldKind, PageRequest, Paginated};

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "pg")]
use sqlx::{postgres::PgPoolOptions, PgPool};
#[cfg(feature = "sqlite")]
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use sea_orm::DatabaseConnection;
#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
#[cfg(feature = "sqlite")]
use sea_orm::SqlxSqliteConnector;

use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for connecting and configuring the database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Invalid database configuration: {0}")]
    InvalidConfig(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Pool knobs; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection.
    pub max_lifetime: Option<Duration>,
    /// Test connection health before acquire.
    pub test_before_acquire: bool,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            test_before_acquire: false,
            create_sqlite_dirs: true,
        }
    }
}

impl From<&PoolCfg> for ConnectOpts {
    fn from(pool: &PoolCfg) -> Self {
        let base = ConnectOpts::default();
        Self {
            max_conns: pool.max_conns.or(base.max_conns),
            min_conns: pool.min_conns,
            acquire_timeout: pool.acquire_timeout.or(base.acquire_timeout),
            idle_timeout: pool.idle_timeout,
            max_lifetime: pool.max_lifetime,
            test_before_acquire: pool.test_before_acquire.unwrap_or(false),
            create_sqlite_dirs: base.create_sqlite_dirs,
        }
    }
}

/// One concrete sqlx pool.
#[derive(Clone, Debug)]
pub enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Main handle.
#[derive(Debug, Clone)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: Arc<DatabaseConnection>,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(redact_credentials_in_dsn(Some(dsn))))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let engine = Self::detect(dsn)?;
        match engine {
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let mut o = PgPoolOptions::new();
                if let Some(n) = opts.max_conns {
                    o = o.max_connections(n);
                }
                if let Some(n) = opts.min_conns {
                    o = o.min_connections(n);
                }
                if let Some(t) = opts.acquire_timeout {
                    o = o.acquire_timeout(t);
                }
                if let Some(t) = opts.idle_timeout {
                    o = o.idle_timeout(t);
                }
                if let Some(t) = opts.max_lifetime {
                    o = o.max_lifetime(t);
                }
                if opts.test_before_acquire {
                    o = o.test_before_acquire(true);
                }
                let pool = o.connect(dsn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                tracing::debug!(dsn = %redact_credentials_in_dsn(Some(dsn)), "postgres pool ready");
                Ok(Self {
                    engine,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.to_string(),
                    sea: Arc::new(sea),
                })
            }
            #[cfg(feature = "sqlite")]
            DbEngine::Sqlite => {
                let dsn = prepare_sqlite_path(dsn, opts.create_sqlite_dirs)?;
                let in_memory = is_memory_dsn(&dsn);

                let mut o = SqlitePoolOptions::new();
                if in_memory {
                    // Every connection to an in-memory DSN opens a separate database,
                    // so the pool must hold exactly one that never expires.
                    o = o
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                } else {
                    if let Some(n) = opts.max_conns {
                        o = o.max_connections(n);
                    }
                    if let Some(n) = opts.min_conns {
                        o = o.min_connections(n);
                    }
                    if let Some(t) = opts.idle_timeout {
                        o = o.idle_timeout(t);
                    }
                    if let Some(t) = opts.max_lifetime {
                        o = o.max_lifetime(t);
                    }
                }
                if let Some(t) = opts.acquire_timeout {
                    o = o.acquire_timeout(t);
                }
                if opts.test_before_acquire {
                    o = o.test_before_acquire(true);
                }

                let pool = o.connect(&dsn).await?;
                let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());
                tracing::debug!(dsn = %dsn, in_memory, "sqlite pool ready");
                Ok(Self {
                    engine,
                    pool: DbPool::Sqlite(pool),
                    dsn,
                    sea: Arc::new(sea),
                })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
            #[cfg(not(feature = "sqlite"))]
            DbEngine::Sqlite => Err(DbError::FeatureDisabled("SQLite feature not enabled")),
        }
    }

    /// Connect using a configuration section (DSN or individual fields).
    pub async fn connect_with_config(cfg: &DbConnConfig) -> Result<Self> {
        let dsn = build_dsn(cfg)?;
        let opts = cfg
            .pool
            .as_ref()
            .map(ConnectOpts::from)
            .unwrap_or_default();
        Self::connect(&dsn, opts).await
    }

    /// Graceful pool close.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    /// DSN used for this connection (may contain credentials; redact before logging).
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// Shared SeaORM connection.
    pub fn sea(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.sea)
    }

    /// Open a new request-scoped session.
    pub fn session(&self) -> DbSession {
        DbSession::new(Arc::clone(&self.sea))
    }

    #[cfg(feature = "pg")]
    pub fn sqlx_postgres(&self) -> Option<&PgPool> {
        match self.pool {
            DbPool::Postgres(ref p) => Some(p),
            #[cfg(feature = "sqlite")]
            _ => None,
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlx_sqlite(&self) -> Option<&SqlitePool> {
        match self.pool {
            DbPool::Sqlite(ref p) => Some(p),
            #[cfg(feature = "pg")]
            _ => None,
        }
    }
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}

/// Normalize a SQLite DSN and make sure the parent directory of a file DSN exists.
#[cfg(feature = "sqlite")]
fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> Result<String> {
    let dsn = dsn.trim();
    if is_memory_dsn(dsn) {
        return Ok(dsn.to_string());
    }

    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))
        .unwrap_or(dsn);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return Err(DbError::InvalidConfig("empty SQLite path in DSN".into()));
    }

    let path = std::path::Path::new(path);
    if create_dirs {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
    }

    // create the file on first connect
    let mut out = format!("sqlite://{}", path.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.contains("mode=") => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}
