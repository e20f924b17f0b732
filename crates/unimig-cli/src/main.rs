mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use unimig_adapters::persistence::sqlite::SqliteDb;
use unimig_adapters::secrets::AesSivSecrets;
use unimig_adapters::silence::FileSilenceWriter;
use unimig_app::context::MigrationOptions;
use unimig_app::migration_service::MigrationService;
use unimig_ports::inbound::AlertMigrator;
use unimig_ports::outbound::AlertmanagerConfigStore;

use crate::config::MigratorConfig;

type Migrator = MigrationService<
    SqliteDb,
    SqliteDb,
    SqliteDb,
    AesSivSecrets,
    SqliteDb,
    SqliteDb,
    SqliteDb,
    FileSilenceWriter,
>;

#[derive(Debug, Parser)]
#[command(name = "unimig", about = "Migrate legacy dashboard alerts to unified alerting")]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(short, long, env = "UNIMIG_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "UNIMIG_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate every org, or a single one with --org.
    Migrate {
        #[arg(long)]
        org: Option<i64>,
        /// Revert already migrated orgs and migrate them again.
        #[arg(long)]
        force: bool,
    },
    /// Delete everything a previous migration created for an org.
    Revert {
        #[arg(long)]
        org: i64,
    },
    /// Print the org's alertmanager configuration as JSON.
    ShowConfig {
        #[arg(long)]
        org: i64,
    },
}

fn load_config(cli: &Cli) -> Result<MigratorConfig> {
    let mut config = match &cli.config {
        Some(path) => MigratorConfig::load(path)?,
        None => MigratorConfig::default(),
    };
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn build_migrator(config: &MigratorConfig, db: &SqliteDb) -> Result<Migrator> {
    if config.secret_key.is_empty() {
        anyhow::bail!("secret_key must be set to decrypt channel secure settings");
    }
    let secrets = AesSivSecrets::from_hex(&config.secret_key).context("invalid secret_key")?;
    let options = MigrationOptions {
        case_insensitive_uids: config.case_insensitive_uids,
    };

    Ok(MigrationService::new(
        db.clone(),
        db.clone(),
        db.clone(),
        secrets,
        db.clone(),
        db.clone(),
        db.clone(),
        FileSilenceWriter::new(&config.data_dir),
        options,
    ))
}

async fn migrate<M: AlertMigrator>(migrator: &M, org: Option<i64>, force: bool) -> Result<()> {
    let now = Utc::now();
    let output = match org {
        Some(org_id) => {
            if force {
                let reverted = migrator.revert_org(org_id).await?;
                info!(org_id, rules = reverted.deleted_rules, "reverted before re-migration");
            }
            serde_json::to_string_pretty(&migrator.migrate_org(org_id, now).await?)?
        }
        None => {
            let summary = migrator.run(force, now).await?;
            info!(
                migrated = summary.migrated.len(),
                skipped = summary.skipped.len(),
                reverted = summary.reverted.len(),
                "migration finished"
            );
            serde_json::to_string_pretty(&summary)?
        }
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db = SqliteDb::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    match cli.command {
        Command::Migrate { org, force } => {
            let migrator = build_migrator(&config, &db)?;
            migrate(&migrator, org, force || config.force_migration).await
        }
        Command::Revert { org } => {
            let migrator = build_migrator(&config, &db)?;
            let summary = migrator.revert_org(org).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::ShowConfig { org } => {
            match db.get_config(org).await? {
                Some(am) => println!("{}", serde_json::to_string_pretty(&am)?),
                None => anyhow::bail!("org {org} has no alertmanager configuration"),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_migrate_flags() {
        let cli = Cli::parse_from(["unimig", "--database-url", "sqlite::memory:", "migrate", "--force"]);
        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        assert!(matches!(
            cli.command,
            Command::Migrate {
                org: None,
                force: true
            }
        ));
    }

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::parse_from(["unimig", "--data-dir", "/var/lib/am", "revert", "--org", "2"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.data_dir, "/var/lib/am");
        assert_eq!(config.database_url, "sqlite://unimig.db?mode=rwc");
        assert!(matches!(cli.command, Command::Revert { org: 2 }));
    }

    #[tokio::test]
    async fn migrator_requires_a_secret_key() {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        let config = MigratorConfig::default();
        assert!(build_migrator(&config, &db).is_err());

        let config = MigratorConfig {
            secret_key: "11".repeat(32),
            ..MigratorConfig::default()
        };
        assert!(build_migrator(&config, &db).is_ok());
    }
}
