mod alertmanager;
mod datasource;
mod folder;
mod legacy;
mod rule;
mod state;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use unimig_ports::error::PortError;

/// Legacy alerting tables plus the unified alerting tables the migration
/// writes to, in one SQLite database.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS alert_notification (
        id INTEGER PRIMARY KEY,
        org_id INTEGER NOT NULL,
        uid TEXT NOT NULL DEFAULT '',
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        disable_resolve_message INTEGER NOT NULL DEFAULT 0,
        settings TEXT NOT NULL DEFAULT '{}',
        secure_settings TEXT NOT NULL DEFAULT '{}',
        send_reminder INTEGER NOT NULL DEFAULT 0,
        frequency INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS alert (
        id INTEGER PRIMARY KEY,
        org_id INTEGER NOT NULL,
        dashboard_id INTEGER NOT NULL,
        panel_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        message TEXT NOT NULL DEFAULT '',
        state TEXT NOT NULL DEFAULT '',
        frequency INTEGER NOT NULL DEFAULT 0,
        for_secs INTEGER NOT NULL DEFAULT 0,
        settings TEXT NOT NULL DEFAULT 'null'
    )",
    "CREATE INDEX IF NOT EXISTS idx_alert_org ON alert(org_id)",
    "CREATE TABLE IF NOT EXISTS dashboard (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        org_id INTEGER NOT NULL,
        uid TEXT NOT NULL,
        title TEXT NOT NULL,
        folder_id INTEGER NOT NULL DEFAULT 0,
        is_folder INTEGER NOT NULL DEFAULT 0,
        has_acl INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_dashboard_org_uid ON dashboard(org_id, uid)",
    "CREATE TABLE IF NOT EXISTS dashboard_acl (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        org_id INTEGER NOT NULL,
        dashboard_id INTEGER NOT NULL,
        data TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS data_source (
        id INTEGER PRIMARY KEY,
        org_id INTEGER NOT NULL,
        uid TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS alert_rule (
        org_id INTEGER NOT NULL,
        uid TEXT NOT NULL,
        namespace_uid TEXT NOT NULL,
        title TEXT NOT NULL,
        data TEXT NOT NULL,
        PRIMARY KEY (org_id, uid)
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_alert_rule_title
     ON alert_rule(org_id, namespace_uid, title)",
    "CREATE TABLE IF NOT EXISTS alert_configuration (
        org_id INTEGER PRIMARY KEY,
        configuration TEXT NOT NULL,
        configuration_version TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS alert_migration_state (
        org_id INTEGER PRIMARY KEY,
        data TEXT NOT NULL
    )",
];

fn persistence(e: impl std::fmt::Display) -> PortError {
    PortError::Persistence(e.to_string())
}

impl SqliteDb {
    pub async fn new(url: &str) -> Result<Self, PortError> {
        // every connection to an in-memory database gets its own empty copy
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| PortError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), PortError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(persistence)?;
        }
        Ok(())
    }
}
