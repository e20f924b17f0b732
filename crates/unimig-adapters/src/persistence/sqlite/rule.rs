use async_trait::async_trait;

use unimig_core::rule::AlertRule;
use unimig_ports::error::PortError;
use unimig_ports::outbound::RuleStore;

use super::{persistence, SqliteDb};

#[async_trait]
impl RuleStore for SqliteDb {
    /// All rules land or none do.
    async fn insert_rules(&self, rules: &[AlertRule]) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        for rule in rules {
            let data = serde_json::to_string(rule).map_err(persistence)?;
            sqlx::query(
                "INSERT INTO alert_rule (org_id, uid, namespace_uid, title, data)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(rule.org_id)
            .bind(&rule.uid)
            .bind(&rule.namespace_uid)
            .bind(&rule.title)
            .bind(&data)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)
    }

    async fn list_rules(&self, org_id: i64) -> Result<Vec<AlertRule>, PortError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM alert_rule WHERE org_id = ? ORDER BY rowid")
                .bind(org_id)
                .fetch_all(&self.pool)
                .await
                .map_err(persistence)?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_str(&data).map_err(persistence))
            .collect()
    }

    async fn delete_rules(&self, org_id: i64, uids: &[String]) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        for uid in uids {
            sqlx::query("DELETE FROM alert_rule WHERE org_id = ? AND uid = ?")
                .bind(org_id)
                .bind(uid)
                .execute(&mut *tx)
                .await
                .map_err(persistence)?;
        }

        tx.commit().await.map_err(persistence)
    }
}
