use async_trait::async_trait;

use unimig_core::datasource::{Datasource, DatasourceRef};
use unimig_ports::error::PortError;
use unimig_ports::outbound::DatasourceCache;

use super::{persistence, SqliteDb};

type DatasourceRow = (i64, i64, String, String, String, i64);

const COLUMNS: &str = "SELECT id, org_id, uid, name, type, is_default FROM data_source";

fn datasource_from_row((id, org_id, uid, name, kind, is_default): DatasourceRow) -> Datasource {
    Datasource {
        id,
        org_id,
        uid,
        name,
        kind,
        is_default: is_default != 0,
    }
}

impl SqliteDb {
    pub async fn insert_datasource(&self, datasource: &Datasource) -> Result<(), PortError> {
        sqlx::query(
            "INSERT INTO data_source (id, org_id, uid, name, type, is_default)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(datasource.id)
        .bind(datasource.org_id)
        .bind(&datasource.uid)
        .bind(&datasource.name)
        .bind(&datasource.kind)
        .bind(datasource.is_default as i64)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;
        Ok(())
    }
}

#[async_trait]
impl DatasourceCache for SqliteDb {
    async fn get_datasource(
        &self,
        org_id: i64,
        reference: &DatasourceRef,
    ) -> Result<Option<Datasource>, PortError> {
        let filter = match reference {
            DatasourceRef::Default => "is_default = 1",
            DatasourceRef::Id(_) => "id = ?",
            DatasourceRef::Uid(_) => "uid = ?",
            DatasourceRef::Name(_) => "name = ?",
        };
        let sql = format!("{COLUMNS} WHERE org_id = ? AND {filter} ORDER BY id LIMIT 1");

        let query = sqlx::query_as::<_, DatasourceRow>(&sql).bind(org_id);
        let query = match reference {
            DatasourceRef::Default => query,
            DatasourceRef::Id(id) => query.bind(*id),
            DatasourceRef::Uid(uid) => query.bind(uid.as_str()),
            DatasourceRef::Name(name) => query.bind(name.as_str()),
        };

        let row = query.fetch_optional(&self.pool).await.map_err(persistence)?;
        Ok(row.map(datasource_from_row))
    }
}
