use async_trait::async_trait;

use unimig_core::state::OrgMigrationState;
use unimig_ports::error::PortError;
use unimig_ports::outbound::MigrationStateStore;

use super::{persistence, SqliteDb};

#[async_trait]
impl MigrationStateStore for SqliteDb {
    async fn get_state(&self, org_id: i64) -> Result<OrgMigrationState, PortError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM alert_migration_state WHERE org_id = ?")
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(persistence)?;

        match row {
            Some((data,)) => serde_json::from_str(&data).map_err(persistence),
            None => Ok(OrgMigrationState::new(org_id)),
        }
    }

    async fn save_state(&self, state: &OrgMigrationState) -> Result<(), PortError> {
        let data = serde_json::to_string(state).map_err(persistence)?;
        sqlx::query("INSERT OR REPLACE INTO alert_migration_state (org_id, data) VALUES (?, ?)")
            .bind(state.org_id)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_org_is_not_migrated() {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        assert_eq!(db.get_state(4).await.unwrap(), OrgMigrationState::new(4));
    }

    #[tokio::test]
    async fn saved_state_round_trips_and_can_be_reset() {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        let mut state = OrgMigrationState::completed(1, vec!["f".into()], vec!["r".into()]);
        db.save_state(&state).await.unwrap();
        assert_eq!(db.get_state(1).await.unwrap(), state);

        state.reset();
        db.save_state(&state).await.unwrap();
        assert!(!db.get_state(1).await.unwrap().migrated);
    }
}
