use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use unimig_core::folder::{Dashboard, Folder};
use unimig_core::legacy::{DashAlert, DashAlertSettings, ExecutionErrorOption, NoDataOption};
use unimig_core::rule::{
    adjust_interval, channel_label, migrate_message_template, migrate_queries, plan_conditions,
    rule_group_name, truncate_title, AlertRule, ExecErrState, NoDataState, QueryNote,
    ALERT_ID_ANNOTATION, DASHBOARD_UID_ANNOTATION, MESSAGE_ANNOTATION, PANEL_ID_ANNOTATION,
    SILENCE_RULE_UID_LABEL, USE_LEGACY_CHANNELS_LABEL,
};
use unimig_core::silence::Silence;
use unimig_ports::outbound::DatasourceCache;

use crate::context::MigrationContext;
use crate::error::AppError;

/// Where a translated rule lands.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub dashboard: &'a Dashboard,
    pub folder: &'a Folder,
}

fn log_query_note(rule: &str, note: &QueryNote) {
    match note {
        QueryNote::PrometheusBothToRange { ref_id } => warn!(
            rule,
            ref_id = %ref_id,
            "Prometheus 'Both' type queries are not supported in unified alerting, converting to range query"
        ),
        QueryNote::UnparsableFlag { ref_id, field, raw } => info!(
            rule,
            ref_id = %ref_id,
            field = *field,
            raw = %raw,
            "failed to parse flag on Prometheus query"
        ),
        QueryNote::UnknownDatasource { ref_id, reason } => info!(
            rule,
            ref_id = %ref_id,
            reason = %reason,
            "unable to convert query that resembles a Prometheus 'Both' type query to 'Range'"
        ),
    }
}

fn no_data_option(rule: &str, raw: &str) -> Option<NoDataOption> {
    let option = NoDataOption::parse(raw);
    if option.is_none() {
        warn!(rule, value = raw, "unknown no data state, using NoData");
    }
    option
}

fn execution_error_option(rule: &str, raw: &str) -> Option<ExecutionErrorOption> {
    let option = ExecutionErrorOption::parse(raw);
    if option.is_none() {
        warn!(rule, value = raw, "unknown execution error state, using Error");
    }
    option
}

/// Turns legacy dashboard alerts into unified alert rules.
pub struct RuleTranslator<'a, D: DatasourceCache> {
    datasources: &'a D,
}

impl<'a, D: DatasourceCache> RuleTranslator<'a, D> {
    pub fn new(datasources: &'a D) -> Self {
        Self { datasources }
    }

    /// `channel_uids` are the migrated integration UIDs the alert notified.
    pub async fn translate(
        &self,
        ctx: &mut MigrationContext,
        alert: &DashAlert,
        settings: &DashAlertSettings,
        placement: Placement<'_>,
        channel_uids: &[String],
        now: DateTime<Utc>,
    ) -> Result<AlertRule, AppError> {
        self.build(ctx, alert, settings, placement, channel_uids, now)
            .await
            .map_err(|source| AppError::Translate {
                name: alert.name.clone(),
                dashboard_uid: placement.dashboard.uid.clone(),
                org_id: alert.org_id,
                source: Box::new(source),
            })
    }

    async fn build(
        &self,
        ctx: &mut MigrationContext,
        alert: &DashAlert,
        settings: &DashAlertSettings,
        placement: Placement<'_>,
        channel_uids: &[String],
        now: DateTime<Utc>,
    ) -> Result<AlertRule, AppError> {
        let plan = plan_conditions(&settings.conditions)?;
        let condition = plan.condition_ref_id().to_string();

        let mut data = Vec::with_capacity(plan.queries.len() + 1);
        for query in plan.queries {
            let datasource = self
                .datasources
                .get_datasource(alert.org_id, &query.datasource)
                .await?
                .ok_or_else(|| AppError::DatasourceNotFound(query.datasource.to_string()))?;
            data.push(query.resolve(&datasource));
        }
        data.push(plan.condition);

        let (data, notes) = migrate_queries(data)?;
        for note in &notes {
            log_query_note(&alert.name, note);
        }

        let uid = ctx.seen_uids.generate()?;
        let title = ctx.titles(&placement.folder.uid).claim(&alert.name, &uid);
        if title != truncate_title(&alert.name) {
            debug!(old_name = %alert.name, new_name = %title, "duplicate alert rule name, renaming");
        }

        let mut labels = settings.tags();
        labels.insert(USE_LEGACY_CHANNELS_LABEL.to_string(), "true".to_string());
        for channel_uid in channel_uids {
            labels.insert(channel_label(channel_uid), "true".to_string());
        }
        labels.insert(SILENCE_RULE_UID_LABEL.to_string(), uid.clone());

        let annotations = BTreeMap::from([
            (
                DASHBOARD_UID_ANNOTATION.to_string(),
                placement.dashboard.uid.clone(),
            ),
            (PANEL_ID_ANNOTATION.to_string(), alert.panel_id.to_string()),
            (ALERT_ID_ANNOTATION.to_string(), alert.id.to_string()),
            (
                MESSAGE_ANNOTATION.to_string(),
                migrate_message_template(&alert.message),
            ),
        ]);

        let no_data = no_data_option(&title, &settings.no_data_state);
        let exec_err = execution_error_option(&title, &settings.execution_error_state);

        if exec_err == Some(ExecutionErrorOption::KeepState) {
            match Silence::for_error(&uid, now) {
                Ok(silence) => ctx.silences.push(silence),
                Err(e) => error!(rule = %title, error = %e, "failed to create silence for Error"),
            }
        }
        if no_data == Some(NoDataOption::KeepState) {
            match Silence::for_no_data(&uid, now) {
                Ok(silence) => ctx.silences.push(silence),
                Err(e) => error!(rule = %title, error = %e, "failed to create silence for NoData"),
            }
        }

        Ok(AlertRule {
            org_id: alert.org_id,
            uid,
            title,
            condition,
            data,
            interval_seconds: adjust_interval(alert.frequency_secs),
            version: 1,
            namespace_uid: placement.folder.uid.clone(),
            dashboard_uid: Some(placement.dashboard.uid.clone()),
            panel_id: Some(alert.panel_id),
            rule_group: rule_group_name(&placement.dashboard.title, alert.panel_id),
            rule_group_index: 1,
            for_seconds: alert.for_secs,
            updated: now,
            labels,
            annotations,
            is_paused: alert.is_paused(),
            no_data_state: no_data.map_or(NoDataState::NoData, NoDataState::from),
            exec_err_state: exec_err.map_or(ExecErrState::Error, ExecErrState::from),
        })
    }
}
