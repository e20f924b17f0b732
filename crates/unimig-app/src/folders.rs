use tracing::{info, warn};

use unimig_core::folder::{alert_folder_name, Dashboard, Folder, GENERAL_ALERTING_FOLDER};
use unimig_core::legacy::DashAlert;
use unimig_ports::outbound::FolderService;

use crate::context::MigrationContext;
use crate::error::AppError;

/// Picks the folder each migrated rule lives in.
pub struct FolderResolver<'a, F: FolderService> {
    folders: &'a F,
}

impl<'a, F: FolderService> FolderResolver<'a, F> {
    pub fn new(folders: &'a F) -> Self {
        Self { folders }
    }

    /// Dashboards with custom permissions get a folder of their own carrying
    /// the same ACL. Other dashboards use their parent folder, or the
    /// general alerting folder when they have none.
    pub async fn resolve(
        &self,
        ctx: &mut MigrationContext,
        alert: &DashAlert,
    ) -> Result<(Dashboard, Folder), AppError> {
        let dashboard = self
            .folders
            .get_dashboard(alert.org_id, alert.dashboard_id)
            .await?
            .ok_or(AppError::DashboardNotFound {
                dashboard_id: alert.dashboard_id,
                org_id: alert.org_id,
            })?;

        let folder = if dashboard.has_acl {
            self.permission_folder(ctx, &dashboard).await?
        } else if dashboard.folder_id > 0 {
            match self
                .folders
                .get_folder_by_id(dashboard.org_id, dashboard.folder_id)
                .await?
            {
                Some(folder) => folder,
                None => {
                    warn!(
                        dashboard = %dashboard.uid,
                        folder_id = dashboard.folder_id,
                        "dashboard folder not found, using general alerting folder"
                    );
                    self.general_folder(ctx).await?
                }
            }
        } else {
            self.general_folder(ctx).await?
        };

        if folder.uid.is_empty() {
            return Err(AppError::EmptyFolderUid(dashboard.uid));
        }
        Ok((dashboard, folder))
    }

    async fn permission_folder(
        &self,
        ctx: &mut MigrationContext,
        dashboard: &Dashboard,
    ) -> Result<Folder, AppError> {
        if let Some(folder) = ctx.permission_folders.get(&dashboard.uid) {
            return Ok(folder.clone());
        }

        // same-named folders from outside this run are never reused
        let title = alert_folder_name(&dashboard.title, &dashboard.uid);
        let folder = self.create(ctx, dashboard.org_id, &title).await?;
        let acl = self
            .folders
            .get_acl(dashboard.org_id, dashboard.id)
            .await?;
        self.folders
            .set_acl(dashboard.org_id, folder.id, &acl)
            .await?;
        info!(
            folder = %folder.uid,
            dashboard = %dashboard.uid,
            entries = acl.len(),
            "created folder with dashboard permissions"
        );
        ctx.permission_folders
            .insert(dashboard.uid.clone(), folder.clone());
        Ok(folder)
    }

    async fn general_folder(&self, ctx: &mut MigrationContext) -> Result<Folder, AppError> {
        if let Some(folder) = &ctx.general_folder {
            return Ok(folder.clone());
        }
        let org_id = ctx.org_id;
        let folder = match self
            .folders
            .get_folder_by_title(org_id, GENERAL_ALERTING_FOLDER)
            .await?
        {
            Some(existing) => existing,
            None => self.create(ctx, org_id, GENERAL_ALERTING_FOLDER).await?,
        };
        ctx.general_folder = Some(folder.clone());
        Ok(folder)
    }

    async fn create(
        &self,
        ctx: &mut MigrationContext,
        org_id: i64,
        title: &str,
    ) -> Result<Folder, AppError> {
        let uid = ctx.seen_uids.generate()?;
        let folder = self.folders.create_folder(org_id, &uid, title).await?;
        ctx.record_created_folder(&folder);
        Ok(folder)
    }
}
