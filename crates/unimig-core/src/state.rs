use serde::{Deserialize, Serialize};

/// Bumped when the shape of migrated resources changes.
pub const MIGRATION_VERSION: i64 = 1;

/// What a migration pass created for one org, so it can be undone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMigrationState {
    pub org_id: i64,
    pub migrated: bool,
    #[serde(default)]
    pub created_folders: Vec<String>,
    #[serde(default)]
    pub migrated_rules: Vec<String>,
    #[serde(default)]
    pub version: i64,
}

impl OrgMigrationState {
    pub fn new(org_id: i64) -> Self {
        Self {
            org_id,
            ..Self::default()
        }
    }

    pub fn completed(
        org_id: i64,
        created_folders: Vec<String>,
        migrated_rules: Vec<String>,
    ) -> Self {
        Self {
            org_id,
            migrated: true,
            created_folders,
            migrated_rules,
            version: MIGRATION_VERSION,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.org_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_forgets_everything_but_the_org() {
        let mut state = OrgMigrationState::completed(3, vec!["f".into()], vec!["r".into()]);
        state.reset();
        assert_eq!(state, OrgMigrationState::new(3));
        assert!(!state.migrated);
    }

    #[test]
    fn missing_lists_deserialize_as_empty() {
        let state: OrgMigrationState =
            serde_json::from_str(r#"{"org_id": 1, "migrated": true}"#).unwrap();
        assert!(state.created_folders.is_empty());
        assert_eq!(state.version, 0);
    }
}
