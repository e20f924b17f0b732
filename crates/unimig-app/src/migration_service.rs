use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use unimig_core::alertmanager::CONTACT_LABEL;
use unimig_core::channel::is_discontinued;
use unimig_core::legacy::DashAlert;
use unimig_core::state::OrgMigrationState;
use unimig_ports::inbound::AlertMigrator;
use unimig_ports::outbound::{
    AlertmanagerConfigStore, DatasourceCache, FolderService, LegacyStore, MigrationStateStore,
    RuleStore, SecretsService, SilenceWriter,
};
use unimig_ports::types::{OrgMigrationSummary, RevertSummary, RunSummary};

use crate::context::{MigrationContext, MigrationOptions};
use crate::error::AppError;
use crate::folders::FolderResolver;
use crate::receivers::{validate, ReceiverBuilder, ReceiverPlan};
use crate::rules::{Placement, RuleTranslator};

pub struct MigrationService<L, F, D, S, R, A, M, W>
where
    L: LegacyStore,
    F: FolderService,
    D: DatasourceCache,
    S: SecretsService,
    R: RuleStore,
    A: AlertmanagerConfigStore,
    M: MigrationStateStore,
    W: SilenceWriter,
{
    legacy: L,
    folders: F,
    datasources: D,
    secrets: S,
    rules: R,
    am_configs: A,
    states: M,
    silences: W,
    options: MigrationOptions,
}

impl<L, F, D, S, R, A, M, W> MigrationService<L, F, D, S, R, A, M, W>
where
    L: LegacyStore,
    F: FolderService,
    D: DatasourceCache,
    S: SecretsService,
    R: RuleStore,
    A: AlertmanagerConfigStore,
    M: MigrationStateStore,
    W: SilenceWriter,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        legacy: L,
        folders: F,
        datasources: D,
        secrets: S,
        rules: R,
        am_configs: A,
        states: M,
        silences: W,
        options: MigrationOptions,
    ) -> Self {
        Self {
            legacy,
            folders,
            datasources,
            secrets,
            rules,
            am_configs,
            states,
            silences,
            options,
        }
    }

    pub async fn run(&self, force: bool, now: DateTime<Utc>) -> Result<RunSummary, AppError> {
        let mut summary = RunSummary::default();
        for org_id in self.legacy.list_org_ids().await? {
            let state = self.states.get_state(org_id).await?;
            if state.migrated {
                if !force {
                    info!(org_id, "org already migrated, skipping");
                    summary.skipped.push(org_id);
                    continue;
                }
                info!(org_id, "forcing re-migration of org");
                summary.reverted.push(self.revert_org(org_id).await?);
            }
            summary.migrated.push(self.migrate_org(org_id, now).await?);
        }
        Ok(summary)
    }

    /// Migrates one org. Nothing created by a failed pass is left behind.
    pub async fn migrate_org(
        &self,
        org_id: i64,
        now: DateTime<Utc>,
    ) -> Result<OrgMigrationSummary, AppError> {
        if self.states.get_state(org_id).await?.migrated {
            return Err(AppError::AlreadyMigrated(org_id));
        }

        let mut ctx = MigrationContext::new(org_id, self.options);
        match self.migrate_into(&mut ctx, now).await {
            Ok(summary) => {
                info!(
                    org_id,
                    rules = summary.rules,
                    receivers = summary.receivers,
                    folders = summary.created_folders.len(),
                    silences = summary.silences,
                    "org migrated"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(org_id, alert_id = ?e.alert_id(), error = %e, "org migration failed, cleaning up");
                self.cleanup(&ctx).await;
                Err(e)
            }
        }
    }

    async fn migrate_into(
        &self,
        ctx: &mut MigrationContext,
        now: DateTime<Utc>,
    ) -> Result<OrgMigrationSummary, AppError> {
        let org_id = ctx.org_id;

        let channels: Vec<_> = self
            .legacy
            .list_channels(org_id)
            .await?
            .into_iter()
            .filter(|c| {
                if is_discontinued(&c.kind) {
                    error!(kind = %c.kind, name = %c.name, uid = %c.uid, "discontinued notification channel found");
                    return false;
                }
                true
            })
            .collect();
        let plan = ReceiverBuilder::new(&self.secrets)
            .build(ctx, &channels)
            .await?;

        let alerts = self.legacy.list_dash_alerts(org_id).await?;
        info!(org_id, alerts = alerts.len(), "alerts found to migrate");
        for alert in &alerts {
            self.migrate_alert(ctx, &plan, alert, now)
                .await
                .map_err(|e| AppError::for_alert(alert.id, e))?;
        }

        for rule in &mut ctx.rules {
            let refs = ctx
                .rule_channels
                .get(&rule.uid)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if let Some(contacts) = plan.contact_label(&rule.title, refs) {
                rule.labels.insert(CONTACT_LABEL.to_string(), contacts);
            }
        }

        validate(&plan.config)?;

        if !ctx.silences.is_empty() {
            if let Err(e) = self.silences.write_silences(org_id, &ctx.silences).await {
                error!(org_id, error = %e, "failed to write silence file");
            }
        }

        self.rules.insert_rules(&ctx.rules).await?;
        ctx.inserted_rules = ctx.rule_uids();

        self.am_configs.save_config(org_id, &plan.config).await?;
        ctx.config_saved = true;

        let state =
            OrgMigrationState::completed(org_id, ctx.created_folders.clone(), ctx.rule_uids());
        self.states.save_state(&state).await?;

        Ok(OrgMigrationSummary {
            org_id,
            rules: ctx.rules.len(),
            receivers: plan.config.receivers().len(),
            created_folders: ctx.created_folders.clone(),
            silences: ctx.silences.len(),
        })
    }

    async fn migrate_alert(
        &self,
        ctx: &mut MigrationContext,
        plan: &ReceiverPlan,
        alert: &DashAlert,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let settings = alert.parse_settings()?;
        let (dashboard, folder) = FolderResolver::new(&self.folders)
            .resolve(ctx, alert)
            .await?;
        let refs = settings.channel_refs();
        let channel_uids = plan.channel_uids(&refs);

        let rule = RuleTranslator::new(&self.datasources)
            .translate(
                ctx,
                alert,
                &settings,
                Placement {
                    dashboard: &dashboard,
                    folder: &folder,
                },
                &channel_uids,
                now,
            )
            .await?;

        if ctx.rule_channels.insert(rule.uid.clone(), refs).is_some() {
            return Err(AppError::DuplicateRuleUid(rule.uid));
        }
        ctx.rules.push(rule);
        Ok(())
    }

    /// Best effort: failures are logged and the original error is kept.
    async fn cleanup(&self, ctx: &MigrationContext) {
        let org_id = ctx.org_id;
        if ctx.config_saved {
            if let Err(e) = self.am_configs.delete_config(org_id).await {
                warn!(org_id, error = %e, "failed to delete alertmanager config during cleanup");
            }
        }
        if !ctx.inserted_rules.is_empty() {
            if let Err(e) = self.rules.delete_rules(org_id, &ctx.inserted_rules).await {
                warn!(org_id, error = %e, "failed to delete rules during cleanup");
            }
        }
        if !ctx.silences.is_empty() {
            if let Err(e) = self.silences.remove_silences(org_id).await {
                warn!(org_id, error = %e, "failed to remove silences during cleanup");
            }
        }
        for uid in &ctx.created_folders {
            if let Err(e) = self.folders.delete_folder(org_id, uid).await {
                warn!(org_id, folder = %uid, error = %e, "failed to delete folder during cleanup");
            }
        }
    }

    /// Removes what the recorded migration created and marks the org as not
    /// migrated. Folders and dashboards that existed before are kept.
    pub async fn revert_org(&self, org_id: i64) -> Result<RevertSummary, AppError> {
        let mut state = self.states.get_state(org_id).await?;
        if !state.migrated {
            info!(org_id, "org not migrated, nothing to revert");
            return Ok(RevertSummary {
                org_id,
                ..RevertSummary::default()
            });
        }

        if !state.migrated_rules.is_empty() {
            self.rules
                .delete_rules(org_id, &state.migrated_rules)
                .await?;
        }
        self.am_configs.delete_config(org_id).await?;
        if let Err(e) = self.silences.remove_silences(org_id).await {
            warn!(org_id, error = %e, "failed to remove silence file");
        }
        for uid in &state.created_folders {
            self.folders.delete_folder(org_id, uid).await?;
        }

        let summary = RevertSummary {
            org_id,
            deleted_rules: state.migrated_rules.len(),
            deleted_folders: state.created_folders.len(),
        };
        state.reset();
        self.states.save_state(&state).await?;
        info!(
            org_id,
            rules = summary.deleted_rules,
            folders = summary.deleted_folders,
            "org migration reverted"
        );
        Ok(summary)
    }
}

#[async_trait]
impl<L, F, D, S, R, A, M, W> AlertMigrator for MigrationService<L, F, D, S, R, A, M, W>
where
    L: LegacyStore,
    F: FolderService,
    D: DatasourceCache,
    S: SecretsService,
    R: RuleStore,
    A: AlertmanagerConfigStore,
    M: MigrationStateStore,
    W: SilenceWriter,
{
    type Error = AppError;

    async fn run(&self, force: bool, now: DateTime<Utc>) -> Result<RunSummary, AppError> {
        MigrationService::run(self, force, now).await
    }

    async fn migrate_org(
        &self,
        org_id: i64,
        now: DateTime<Utc>,
    ) -> Result<OrgMigrationSummary, AppError> {
        MigrationService::migrate_org(self, org_id, now).await
    }

    async fn revert_org(&self, org_id: i64) -> Result<RevertSummary, AppError> {
        MigrationService::revert_org(self, org_id).await
    }
}
