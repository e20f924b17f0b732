use serde::{Deserialize, Serialize};

use crate::text::truncate;

pub const MAX_FOLDER_NAME_LENGTH: usize = 255;
pub const GENERAL_ALERTING_FOLDER: &str = "General Alerting";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    pub title: String,
    /// Zero when the dashboard sits in the root.
    pub folder_id: i64,
    pub has_acl: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Edit,
    Admin,
}

/// One entry of a dashboard or folder access list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclItem {
    pub user_id: Option<i64>,
    pub team_id: Option<i64>,
    pub role: Option<String>,
    pub permission: Permission,
}

/// Name of the folder created for a dashboard with custom permissions.
pub fn alert_folder_name(dashboard_title: &str, dashboard_uid: &str) -> String {
    let suffix = format!(" Alerts - {dashboard_uid}");
    let title = truncate(
        dashboard_title,
        MAX_FOLDER_NAME_LENGTH.saturating_sub(suffix.len()),
    );
    format!("{title}{suffix}")
}
