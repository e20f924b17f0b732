use std::collections::{BTreeMap, HashMap};

use unimig_core::folder::Folder;
use unimig_core::ids::UidSet;
use unimig_core::legacy::ChannelRef;
use unimig_core::rule::{AlertRule, TitleDeduplicator};
use unimig_core::silence::Silence;

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    /// Treat UIDs differing only in case as colliding.
    pub case_insensitive_uids: bool,
}

/// Everything accumulated while migrating one org. Dropped when the pass
/// ends, nothing leaks into the next org.
#[derive(Debug)]
pub struct MigrationContext {
    pub org_id: i64,
    pub seen_uids: UidSet,
    /// UIDs of folders created by this pass, in creation order.
    pub created_folders: Vec<String>,
    /// Folders created for dashboards with custom permissions, by dashboard UID.
    pub permission_folders: HashMap<String, Folder>,
    pub general_folder: Option<Folder>,
    titles: HashMap<String, TitleDeduplicator>,
    pub silences: Vec<Silence>,
    pub rules: Vec<AlertRule>,
    /// Legacy channel references of each translated rule, by rule UID.
    pub rule_channels: BTreeMap<String, Vec<ChannelRef>>,
    /// Rules already written to the rule store.
    pub inserted_rules: Vec<String>,
    pub config_saved: bool,
}

impl MigrationContext {
    pub fn new(org_id: i64, options: MigrationOptions) -> Self {
        Self {
            org_id,
            seen_uids: UidSet::new(options.case_insensitive_uids),
            created_folders: Vec::new(),
            permission_folders: HashMap::new(),
            general_folder: None,
            titles: HashMap::new(),
            silences: Vec::new(),
            rules: Vec::new(),
            rule_channels: BTreeMap::new(),
            inserted_rules: Vec::new(),
            config_saved: false,
        }
    }

    /// Rule titles already used in the folder `namespace_uid`.
    pub fn titles(&mut self, namespace_uid: &str) -> &mut TitleDeduplicator {
        self.titles.entry(namespace_uid.to_string()).or_default()
    }

    pub fn record_created_folder(&mut self, folder: &Folder) {
        self.created_folders.push(folder.uid.clone());
    }

    pub fn rule_uids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.uid.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_tracked_per_folder() {
        let mut ctx = MigrationContext::new(1, MigrationOptions::default());
        assert_eq!(ctx.titles("f1").claim("cpu", "r1"), "cpu");
        assert_eq!(ctx.titles("f2").claim("cpu", "r2"), "cpu");
        assert_eq!(ctx.titles("f1").claim("cpu", "r3"), "cpu_r3");
    }

    #[test]
    fn options_control_uid_case_sensitivity() {
        let mut ctx = MigrationContext::new(
            1,
            MigrationOptions {
                case_insensitive_uids: true,
            },
        );
        ctx.seen_uids.add("ABC");
        assert!(ctx.seen_uids.contains("abc"));
    }
}
