use async_trait::async_trait;

use unimig_core::folder::{AclItem, Dashboard, Folder};
use unimig_ports::error::PortError;
use unimig_ports::outbound::FolderService;

use super::{persistence, SqliteDb};

type DashboardRow = (i64, i64, String, String, i64, i64);

fn dashboard_from_row((id, org_id, uid, title, folder_id, has_acl): DashboardRow) -> Dashboard {
    Dashboard {
        id,
        org_id,
        uid,
        title,
        folder_id,
        has_acl: has_acl != 0,
    }
}

fn folder_from_row((id, org_id, uid, title): (i64, i64, String, String)) -> Folder {
    Folder {
        id,
        org_id,
        uid,
        title,
    }
}

impl SqliteDb {
    /// Inserts a dashboard (or a folder when `is_folder`) and returns its id.
    pub async fn insert_dashboard(
        &self,
        org_id: i64,
        uid: &str,
        title: &str,
        folder_id: i64,
        is_folder: bool,
        has_acl: bool,
    ) -> Result<i64, PortError> {
        let result = sqlx::query(
            "INSERT INTO dashboard (org_id, uid, title, folder_id, is_folder, has_acl)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(org_id)
        .bind(uid)
        .bind(title)
        .bind(folder_id)
        .bind(is_folder as i64)
        .bind(has_acl as i64)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_acl(
        &self,
        org_id: i64,
        dashboard_id: i64,
        item: &AclItem,
    ) -> Result<(), PortError> {
        let data = serde_json::to_string(item).map_err(persistence)?;
        sqlx::query("INSERT INTO dashboard_acl (org_id, dashboard_id, data) VALUES (?, ?, ?)")
            .bind(org_id)
            .bind(dashboard_id)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

#[async_trait]
impl FolderService for SqliteDb {
    async fn get_dashboard(&self, org_id: i64, id: i64) -> Result<Option<Dashboard>, PortError> {
        let row: Option<DashboardRow> = sqlx::query_as(
            "SELECT id, org_id, uid, title, folder_id, has_acl
             FROM dashboard WHERE org_id = ? AND id = ? AND is_folder = 0",
        )
        .bind(org_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(dashboard_from_row))
    }

    async fn get_folder_by_id(&self, org_id: i64, id: i64) -> Result<Option<Folder>, PortError> {
        let row: Option<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT id, org_id, uid, title
             FROM dashboard WHERE org_id = ? AND id = ? AND is_folder = 1",
        )
        .bind(org_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(folder_from_row))
    }

    async fn get_folder_by_title(
        &self,
        org_id: i64,
        title: &str,
    ) -> Result<Option<Folder>, PortError> {
        let row: Option<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT id, org_id, uid, title
             FROM dashboard WHERE org_id = ? AND title = ? AND is_folder = 1
             ORDER BY id LIMIT 1",
        )
        .bind(org_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(row.map(folder_from_row))
    }

    async fn create_folder(
        &self,
        org_id: i64,
        uid: &str,
        title: &str,
    ) -> Result<Folder, PortError> {
        let id = self
            .insert_dashboard(org_id, uid, title, 0, true, false)
            .await?;
        Ok(Folder {
            id,
            org_id,
            uid: uid.to_string(),
            title: title.to_string(),
        })
    }

    async fn delete_folder(&self, org_id: i64, uid: &str) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query(
            "DELETE FROM dashboard_acl WHERE org_id = ? AND dashboard_id IN
                (SELECT id FROM dashboard WHERE org_id = ? AND uid = ? AND is_folder = 1)",
        )
        .bind(org_id)
        .bind(org_id)
        .bind(uid)
        .execute(&mut *tx)
        .await
        .map_err(persistence)?;

        sqlx::query("DELETE FROM dashboard WHERE org_id = ? AND uid = ? AND is_folder = 1")
            .bind(org_id)
            .bind(uid)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        tx.commit().await.map_err(persistence)
    }

    async fn get_acl(&self, org_id: i64, dashboard_id: i64) -> Result<Vec<AclItem>, PortError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT data FROM dashboard_acl WHERE org_id = ? AND dashboard_id = ? ORDER BY id",
        )
        .bind(org_id)
        .bind(dashboard_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_str(&data).map_err(persistence))
            .collect()
    }

    async fn set_acl(
        &self,
        org_id: i64,
        folder_id: i64,
        items: &[AclItem],
    ) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(persistence)?;

        sqlx::query("DELETE FROM dashboard_acl WHERE org_id = ? AND dashboard_id = ?")
            .bind(org_id)
            .bind(folder_id)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        for item in items {
            let data = serde_json::to_string(item).map_err(persistence)?;
            sqlx::query(
                "INSERT INTO dashboard_acl (org_id, dashboard_id, data) VALUES (?, ?, ?)",
            )
            .bind(org_id)
            .bind(folder_id)
            .bind(&data)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        }

        sqlx::query("UPDATE dashboard SET has_acl = ? WHERE org_id = ? AND id = ?")
            .bind(!items.is_empty() as i64)
            .bind(org_id)
            .bind(folder_id)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;

        tx.commit().await.map_err(persistence)
    }
}
