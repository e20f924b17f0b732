use serde::{Deserialize, Serialize};

/// What one org migration produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMigrationSummary {
    pub org_id: i64,
    pub rules: usize,
    pub receivers: usize,
    pub created_folders: Vec<String>,
    pub silences: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertSummary {
    pub org_id: i64,
    pub deleted_rules: usize,
    pub deleted_folders: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub migrated: Vec<OrgMigrationSummary>,
    /// Orgs left alone because they were already migrated.
    pub skipped: Vec<i64>,
    pub reverted: Vec<RevertSummary>,
}
