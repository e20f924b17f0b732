use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use unimig_core::legacy::{DashAlert, LegacyChannel};
use unimig_ports::error::PortError;
use unimig_ports::outbound::LegacyStore;

use super::{persistence, SqliteDb};

type ChannelRow = (
    i64,
    i64,
    String,
    String,
    String,
    i64,
    i64,
    String,
    String,
    i64,
    i64,
);

type AlertRow = (i64, i64, i64, i64, String, String, String, i64, i64, String);

fn decode_secure_settings(raw: &str) -> Result<BTreeMap<String, Vec<u8>>, PortError> {
    let encoded: BTreeMap<String, String> = serde_json::from_str(raw).map_err(persistence)?;
    encoded
        .into_iter()
        .map(|(key, value)| {
            STANDARD
                .decode(value)
                .map(|bytes| (key, bytes))
                .map_err(persistence)
        })
        .collect()
}

fn channel_from_row(row: ChannelRow) -> Result<LegacyChannel, PortError> {
    let (
        id,
        org_id,
        uid,
        name,
        kind,
        is_default,
        disable_resolve_message,
        settings,
        secure_settings,
        send_reminder,
        frequency,
    ) = row;
    Ok(LegacyChannel {
        id,
        org_id,
        uid,
        name,
        kind,
        is_default: is_default != 0,
        disable_resolve_message: disable_resolve_message != 0,
        settings: serde_json::from_str(&settings).map_err(persistence)?,
        secure_settings: decode_secure_settings(&secure_settings)?,
        send_reminder: send_reminder != 0,
        frequency: Duration::from_secs(frequency.max(0) as u64),
    })
}

fn alert_from_row(row: AlertRow) -> Result<DashAlert, PortError> {
    let (id, org_id, dashboard_id, panel_id, name, message, state, frequency, for_secs, settings) =
        row;
    Ok(DashAlert {
        id,
        org_id,
        dashboard_id,
        panel_id,
        name,
        message,
        state,
        frequency_secs: frequency,
        for_secs,
        settings: serde_json::from_str(&settings).map_err(persistence)?,
    })
}

impl SqliteDb {
    /// Stores a legacy channel row; secure values are kept base64 encoded.
    pub async fn insert_channel(&self, channel: &LegacyChannel) -> Result<(), PortError> {
        let secure: BTreeMap<&str, String> = channel
            .secure_settings
            .iter()
            .map(|(k, v)| (k.as_str(), STANDARD.encode(v)))
            .collect();
        let secure = serde_json::to_string(&secure).map_err(persistence)?;
        let settings = serde_json::to_string(&channel.settings).map_err(persistence)?;

        sqlx::query(
            "INSERT INTO alert_notification
                (id, org_id, uid, name, type, is_default, disable_resolve_message,
                 settings, secure_settings, send_reminder, frequency)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(channel.id)
        .bind(channel.org_id)
        .bind(&channel.uid)
        .bind(&channel.name)
        .bind(&channel.kind)
        .bind(channel.is_default as i64)
        .bind(channel.disable_resolve_message as i64)
        .bind(&settings)
        .bind(&secure)
        .bind(channel.send_reminder as i64)
        .bind(channel.frequency.as_secs() as i64)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    pub async fn insert_dash_alert(&self, alert: &DashAlert) -> Result<(), PortError> {
        let settings = serde_json::to_string(&alert.settings).map_err(persistence)?;

        sqlx::query(
            "INSERT INTO alert
                (id, org_id, dashboard_id, panel_id, name, message, state,
                 frequency, for_secs, settings)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(alert.id)
        .bind(alert.org_id)
        .bind(alert.dashboard_id)
        .bind(alert.panel_id)
        .bind(&alert.name)
        .bind(&alert.message)
        .bind(&alert.state)
        .bind(alert.frequency_secs)
        .bind(alert.for_secs)
        .bind(&settings)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }
}

#[async_trait]
impl LegacyStore for SqliteDb {
    async fn list_org_ids(&self) -> Result<Vec<i64>, PortError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT org_id FROM alert_notification
             UNION SELECT org_id FROM alert
             UNION SELECT org_id FROM dashboard
             ORDER BY org_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn list_channels(&self, org_id: i64) -> Result<Vec<LegacyChannel>, PortError> {
        let rows: Vec<ChannelRow> = sqlx::query_as(
            "SELECT id, org_id, uid, name, type, is_default, disable_resolve_message,
                    settings, secure_settings, send_reminder, frequency
             FROM alert_notification WHERE org_id = ? ORDER BY id",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter().map(channel_from_row).collect()
    }

    async fn list_dash_alerts(&self, org_id: i64) -> Result<Vec<DashAlert>, PortError> {
        let rows: Vec<AlertRow> = sqlx::query_as(
            "SELECT id, org_id, dashboard_id, panel_id, name, message, state,
                    frequency, for_secs, settings
             FROM alert WHERE org_id = ? ORDER BY id",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter().map(alert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn make_channel(id: i64, org_id: i64) -> LegacyChannel {
        LegacyChannel {
            id,
            org_id,
            uid: format!("chan-{id}"),
            name: format!("channel {id}"),
            kind: "slack".into(),
            is_default: true,
            disable_resolve_message: true,
            settings: json!({"recipient": "#ops"}),
            secure_settings: BTreeMap::from([("url".to_string(), vec![0, 159, 146, 150])]),
            send_reminder: true,
            frequency: Duration::from_secs(300),
        }
    }

    fn make_alert(id: i64, org_id: i64) -> DashAlert {
        DashAlert {
            id,
            org_id,
            dashboard_id: 1,
            panel_id: 2,
            name: "High CPU".into(),
            message: "cpu is high".into(),
            state: "paused".into(),
            frequency_secs: 60,
            for_secs: 120,
            settings: json!({"conditions": []}),
        }
    }

    #[tokio::test]
    async fn channels_keep_binary_secure_settings() {
        let db = db().await;
        let channel = make_channel(1, 1);
        db.insert_channel(&channel).await.unwrap();

        let found = db.list_channels(1).await.unwrap();
        assert_eq!(found, vec![channel]);
    }

    #[tokio::test]
    async fn channels_are_scoped_to_org() {
        let db = db().await;
        db.insert_channel(&make_channel(1, 1)).await.unwrap();
        db.insert_channel(&make_channel(2, 2)).await.unwrap();

        let found = db.list_channels(2).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[tokio::test]
    async fn dash_alerts_round_trip() {
        let db = db().await;
        let alert = make_alert(5, 1);
        db.insert_dash_alert(&alert).await.unwrap();

        let found = db.list_dash_alerts(1).await.unwrap();
        assert_eq!(found, vec![alert]);
        assert!(db.list_dash_alerts(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn org_ids_cover_channels_and_alerts() {
        let db = db().await;
        db.insert_channel(&make_channel(1, 3)).await.unwrap();
        db.insert_dash_alert(&make_alert(1, 1)).await.unwrap();

        assert_eq!(db.list_org_ids().await.unwrap(), vec![1, 3]);
    }
}
