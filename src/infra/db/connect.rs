//! Driver options for each engine, built from an already-normalized
//! connection string. Pools are created lazily so building them does no I/O.

use std::str::FromStr;

use sqlx::{
    postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use tracing::debug;

use crate::config::DatabaseSettings;
use crate::domain::connection::{MalformedConnectionString, SslMode, parse_key_value_pairs};
use crate::infra::error::InfraError;

const SQLITE_MEMORY: &str = ":memory:";
const SQLITE_PATH_KEYS: [&str; 3] = ["datasource", "filename", "database"];

/// Lower-case a key and drop the separators Npgsql-style strings tolerate.
fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

/// Build PostgreSQL options from a `Key=Value;...` string.
///
/// `Trust Server Certificate=true` relaxes verifying modes to `Require`,
/// which encrypts without validating the certificate chain.
pub fn postgres_options(connection_string: &str) -> Result<PgConnectOptions, InfraError> {
    let pairs = parse_key_value_pairs(connection_string)?;

    let mut options = PgConnectOptions::new_without_pgpass();
    let mut ssl_mode = None;
    let mut trust_server_certificate = false;
    let mut has_host = false;

    for (key, value) in pairs {
        match canonical_key(&key).as_str() {
            "host" | "server" => {
                has_host = true;
                options = options.host(&value);
            }
            "port" => {
                let port = value
                    .parse::<u16>()
                    .map_err(|_| MalformedConnectionString::invalid_port())?;
                options = options.port(port);
            }
            "database" | "db" => options = options.database(&value),
            "username" | "userid" | "user" => options = options.username(&value),
            "password" | "pwd" => options = options.password(&value),
            "sslmode" => ssl_mode = Some(SslMode::from_str(&value)?),
            "trustservercertificate" => {
                trust_server_certificate = value.trim().eq_ignore_ascii_case("true");
            }
            "applicationname" => options = options.application_name(&value),
            other => debug!(
                target = "withrisk::infra::db",
                key = other,
                "ignoring unsupported connection string key"
            ),
        }
    }

    if !has_host {
        return Err(MalformedConnectionString::missing_host().into());
    }

    let mode = match ssl_mode {
        Some(SslMode::VerifyCa | SslMode::VerifyFull) if trust_server_certificate => {
            SslMode::Require
        }
        Some(mode) => mode,
        None => SslMode::Prefer,
    };

    Ok(options.ssl_mode(pg_ssl_mode(mode)))
}

/// Extract the SQLite file path from a data source string.
///
/// Accepts `Data Source=...`, `Filename=...`, or a bare path.
pub fn sqlite_path(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed.contains('=') {
        if let Ok(pairs) = parse_key_value_pairs(trimmed) {
            if let Some((_, value)) = pairs
                .into_iter()
                .find(|(key, _)| SQLITE_PATH_KEYS.contains(&canonical_key(key).as_str()))
            {
                return value;
            }
        }
    }
    trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed)
        .to_string()
}

pub fn sqlite_options(
    connection_string: &str,
    settings: &DatabaseSettings,
) -> Result<SqliteConnectOptions, InfraError> {
    let path = sqlite_path(connection_string);
    let options = if path == SQLITE_MEMORY {
        SqliteConnectOptions::from_str("sqlite::memory:").map_err(InfraError::from)?
    } else {
        SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
    };

    Ok(options
        .foreign_keys(true)
        .busy_timeout(settings.acquire_timeout))
}

pub fn postgres_pool(options: PgConnectOptions, settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .max_connections(settings.max_connections.get())
        .acquire_timeout(settings.acquire_timeout)
        .connect_lazy_with(options)
}

pub fn sqlite_pool(options: SqliteConnectOptions, settings: &DatabaseSettings) -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections.get())
        .acquire_timeout(settings.acquire_timeout)
        .connect_lazy_with(options)
}
