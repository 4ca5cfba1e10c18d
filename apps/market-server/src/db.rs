use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use runtime::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use url::Url;

pub const MEMORY_DSN: &str = "sqlite::memory:";

/// Backend named by the DSN scheme.
pub fn detect_backend(dsn: &str) -> Result<&'static str> {
    let raw = dsn.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }
    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{raw}': {e}"))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {other}")),
    }
}

/// Rewrite a relative sqlite path against `base_dir`, keeping the query string.
/// In-memory DSNs pass through.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {dsn})"))?;

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
    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating database directory {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Open the configured database; `mock` swaps in an in-memory SQLite.
pub async fn connect(cfg: &DatabaseConfig, base_dir: &Path, mock: bool) -> Result<DatabaseConnection> {
    let mut dsn = if mock {
        MEMORY_DSN.to_string()
    } else {
        cfg.url.trim().to_string()
    };
    let backend = detect_backend(&dsn)?;
    if dsn.starts_with("sqlite://") {
        dsn = absolutize_sqlite_dsn(&dsn, base_dir, true)?;
    }

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if dsn == MEMORY_DSN {
        // every pooled connection would get its own empty database
        opts.max_connections(1);
    } else if let Some(max) = cfg.max_conns {
        opts.max_connections(max);
    }

    tracing::info!(backend, dsn = %dsn, "Connecting to database");
    Database::connect(opts)
        .await
        .with_context(|| format!("connecting to {backend} database"))
}
