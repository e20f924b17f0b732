use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::DomainError;
use crate::legacy::ChannelRef;
use crate::text::quote;

use super::{MatchType, ObjectMatcher, CONTACT_LABEL};

/// Sorted, quoted and comma joined, e.g. `"a","b"`.
pub fn contact_list_to_string<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let sorted: BTreeSet<String> = names.into_iter().map(quote).collect();
    sorted.into_iter().collect::<Vec<_>>().join(",")
}

/// Regex matcher selecting any contact list that contains `receiver`.
pub fn contact_matcher(receiver: &str) -> Result<ObjectMatcher, DomainError> {
    let pattern = format!(".*{}.*", regex::escape(&quote(receiver)));
    ObjectMatcher::new(CONTACT_LABEL, MatchType::Regexp, pattern)
}

/// Receiver names handed out in one org.
#[derive(Debug, Default)]
pub struct ReceiverNames {
    taken: HashSet<String>,
}

impl ReceiverNames {
    /// Double quotes delimit names in the contact label, so they are
    /// replaced. A name still taken after that gets a short hash of the
    /// original name appended.
    ///
    /// Returns the unique name and whether it differs from the sanitized one.
    pub fn claim(&mut self, name: &str) -> (String, bool) {
        let sanitized = name.replace('"', "_");
        if self.taken.insert(sanitized.clone()) {
            return (sanitized, false);
        }

        let digest = format!("{:x}", md5::compute(name.as_bytes()));
        let hashed = format!("{sanitized}_{}", &digest[..6]);
        let mut candidate = hashed.clone();
        let mut n = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{hashed}_{n}");
            n += 1;
        }
        (candidate, true)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

/// Receivers a rule routes to through its contact label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSelection {
    /// Empty when the rule should fall through to the root route.
    pub receivers: BTreeSet<String>,
    /// References that no longer point at a migrated channel.
    pub unresolved: Vec<ChannelRef>,
}

impl ContactSelection {
    pub fn label_value(&self) -> Option<String> {
        if self.receivers.is_empty() {
            return None;
        }
        Some(contact_list_to_string(self.receivers.iter().map(String::as_str)))
    }
}

/// Resolves a rule's channel references to receiver names.
///
/// Rules with no resolvable channel, or only default ones, are left to the
/// root route. Otherwise the defaults are added so they keep notifying.
pub fn select_contacts(
    refs: &[ChannelRef],
    receivers_by_ref: &HashMap<ChannelRef, String>,
    defaults: &BTreeSet<String>,
) -> ContactSelection {
    let mut selection = ContactSelection::default();
    for channel in refs {
        match receivers_by_ref.get(channel) {
            Some(name) => {
                selection.receivers.insert(name.clone());
            }
            None => selection.unresolved.push(channel.clone()),
        }
    }

    if selection.receivers.is_subset(defaults) {
        selection.receivers.clear();
    } else {
        selection.receivers.extend(defaults.iter().cloned());
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn by_ref() -> HashMap<ChannelRef, String> {
        HashMap::from([
            (ChannelRef::Uid("a".into()), "alpha".to_string()),
            (ChannelRef::Id(1), "alpha".to_string()),
            (ChannelRef::Uid("b".into()), "beta".to_string()),
            (ChannelRef::Uid("d".into()), "default".to_string()),
        ])
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn contact_list_is_sorted_and_quoted() {
        assert_eq!(contact_list_to_string(["b", "a"]), "\"a\",\"b\"");
    }

    #[test]
    fn matcher_hits_only_whole_names() {
        let matcher = contact_matcher("ops").unwrap();
        let label = |v: &str| BTreeMap::from([(CONTACT_LABEL.to_string(), v.to_string())]);
        assert!(matcher.matches(&label("\"dev\",\"ops\"")));
        assert!(!matcher.matches(&label("\"devops\"")));
    }

    #[test]
    fn matcher_escapes_regex_characters() {
        let matcher = contact_matcher("a.b (c)").unwrap();
        let label = BTreeMap::from([(CONTACT_LABEL.to_string(), "\"a.b (c)\"".to_string())]);
        assert!(matcher.matches(&label));
    }

    #[test]
    fn receiver_names_replace_quotes() {
        let mut names = ReceiverNames::default();
        assert_eq!(names.claim("say \"hi\""), ("say _hi_".to_string(), false));
    }

    #[test]
    fn receiver_names_are_unique_after_sanitizing() {
        let mut names = ReceiverNames::default();
        let (first, _) = names.claim("a\"b");
        let (second, renamed) = names.claim("a_b");
        assert_eq!(first, "a_b");
        assert!(renamed);
        assert!(second.starts_with("a_b_"));
        assert_eq!(second.len(), "a_b_".len() + 6);

        let (third, _) = names.claim("a_b");
        assert_ne!(third, second);
        assert!(names.contains(&third));
    }

    #[test]
    fn no_refs_use_default_route() {
        let selection = select_contacts(&[], &by_ref(), &set(&["default"]));
        assert_eq!(selection.label_value(), None);
    }

    #[test]
    fn only_default_refs_use_default_route() {
        let refs = [ChannelRef::Uid("d".into())];
        let selection = select_contacts(&refs, &by_ref(), &set(&["default"]));
        assert_eq!(selection.label_value(), None);
    }

    #[test]
    fn specific_refs_include_defaults() {
        let refs = [ChannelRef::Uid("a".into()), ChannelRef::Id(1)];
        let selection = select_contacts(&refs, &by_ref(), &set(&["default"]));
        assert_eq!(
            selection.label_value().as_deref(),
            Some("\"alpha\",\"default\"")
        );
    }

    #[test]
    fn obsolete_refs_are_reported_and_dropped() {
        let refs = [ChannelRef::Uid("gone".into()), ChannelRef::Uid("b".into())];
        let selection = select_contacts(&refs, &by_ref(), &BTreeSet::new());
        assert_eq!(selection.unresolved, vec![ChannelRef::Uid("gone".into())]);
        assert_eq!(selection.label_value().as_deref(), Some("\"beta\""));
    }

    #[test]
    fn only_obsolete_refs_use_default_route() {
        let refs = [ChannelRef::Id(99)];
        let selection = select_contacts(&refs, &by_ref(), &set(&["default"]));
        assert!(selection.receivers.is_empty());
        assert_eq!(selection.unresolved.len(), 1);
    }
}
