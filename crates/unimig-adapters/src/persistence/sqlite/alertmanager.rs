use async_trait::async_trait;

use unimig_core::alertmanager::{AlertmanagerConfig, CONFIG_VERSION};
use unimig_ports::error::PortError;
use unimig_ports::outbound::AlertmanagerConfigStore;

use super::{persistence, SqliteDb};

#[async_trait]
impl AlertmanagerConfigStore for SqliteDb {
    async fn save_config(
        &self,
        org_id: i64,
        config: &AlertmanagerConfig,
    ) -> Result<(), PortError> {
        let configuration = serde_json::to_string(config).map_err(persistence)?;

        sqlx::query(
            "INSERT OR REPLACE INTO alert_configuration
                (org_id, configuration, configuration_version)
             VALUES (?, ?, ?)",
        )
        .bind(org_id)
        .bind(&configuration)
        .bind(CONFIG_VERSION)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    async fn get_config(&self, org_id: i64) -> Result<Option<AlertmanagerConfig>, PortError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT configuration FROM alert_configuration WHERE org_id = ?")
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence)?;

        row.map(|(raw,)| serde_json::from_str(&raw).map_err(persistence))
            .transpose()
    }

    async fn delete_config(&self, org_id: i64) -> Result<(), PortError> {
        sqlx::query("DELETE FROM alert_configuration WHERE org_id = ?")
            .bind(org_id)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unimig_core::alertmanager::{Receiver, Route, DEFAULT_RECEIVER_NAME};

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn config() -> AlertmanagerConfig {
        AlertmanagerConfig::new(
            Route::root(DEFAULT_RECEIVER_NAME, None),
            vec![Receiver::new(DEFAULT_RECEIVER_NAME, Vec::new())],
        )
    }

    #[tokio::test]
    async fn missing_config_is_none() {
        let db = db().await;
        assert!(db.get_config(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_config() {
        let db = db().await;
        db.save_config(1, &config()).await.unwrap();

        let mut updated = config();
        updated
            .alertmanager_config
            .receivers
            .push(Receiver::new("other", Vec::new()));
        db.save_config(1, &updated).await.unwrap();

        assert_eq!(db.get_config(1).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn delete_removes_config() {
        let db = db().await;
        db.save_config(1, &config()).await.unwrap();
        db.delete_config(1).await.unwrap();
        assert!(db.get_config(1).await.unwrap().is_none());
    }
}
