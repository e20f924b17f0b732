use std::collections::HashSet;

use crate::text::truncate;

use super::{truncate_title, MAX_TITLE_LENGTH};

/// Tracks the rule titles already used inside one folder.
#[derive(Debug, Clone, Default)]
pub struct TitleDeduplicator {
    titles: HashSet<String>,
}

impl TitleDeduplicator {
    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    pub fn add(&mut self, title: &str) {
        self.titles.insert(title.to_string());
    }

    /// `<title>_<uid>`, cutting the title so the result stays within the
    /// maximum title length.
    pub fn deduplicate(title: &str, uid: &str) -> String {
        let suffix = format!("_{uid}");
        let base = truncate(title, MAX_TITLE_LENGTH.saturating_sub(suffix.len()));
        format!("{base}{suffix}")
    }

    /// Reserves a unique title for the rule `uid`, returning it. A counter
    /// follows the uid if `<title>_<uid>` is itself taken.
    pub fn claim(&mut self, name: &str, uid: &str) -> String {
        let base = truncate_title(name).to_string();
        let mut title = base.clone();
        let mut attempt = 0;
        while self.contains(&title) {
            title = match attempt {
                0 => Self::deduplicate(&base, uid),
                n => Self::deduplicate(&base, &format!("{uid}_{n}")),
            };
            attempt += 1;
        }
        self.add(&title);
        title
    }
}
