use std::collections::{BTreeMap, HashSet};

use super::Route;

/// Evaluates a routing tree the way alertmanager dispatches alerts.
pub struct RoutingTree<'a> {
    root: &'a Route,
}

impl<'a> RoutingTree<'a> {
    pub fn new(root: &'a Route) -> Self {
        Self { root }
    }

    /// Receivers a label set is delivered to. The root always matches.
    pub fn receivers_for(&self, labels: &BTreeMap<String, String>) -> Vec<&'a str> {
        let mut out = Vec::new();
        collect(self.root, labels, &mut out);
        let mut seen = HashSet::new();
        out.retain(|name| seen.insert(*name));
        out
    }
}

fn collect<'a>(route: &'a Route, labels: &BTreeMap<String, String>, out: &mut Vec<&'a str>) {
    let before = out.len();
    for child in &route.routes {
        if !child.matches(labels) {
            continue;
        }
        collect(child, labels, out);
        if !child.continue_matching {
            break;
        }
    }
    if out.len() == before {
        out.push(&route.receiver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alertmanager::{contact_list_to_string, ModelDuration, CONTACT_LABEL};

    fn tree() -> Route {
        let mut root = Route::root("default", None);
        for name in ["alpha", "beta"] {
            root.routes
                .push(Route::for_contact(name, ModelDuration::from_hours(1)).unwrap());
        }
        root
    }

    fn contacts(names: &[&str]) -> BTreeMap<String, String> {
        BTreeMap::from([(
            CONTACT_LABEL.to_string(),
            contact_list_to_string(names.iter().copied()),
        )])
    }

    #[test]
    fn unlabelled_alert_reaches_root_receiver() {
        let root = tree();
        let tree = RoutingTree::new(&root);
        assert_eq!(tree.receivers_for(&BTreeMap::new()), vec!["default"]);
    }

    #[test]
    fn continue_lets_every_listed_contact_match() {
        let root = tree();
        let tree = RoutingTree::new(&root);
        assert_eq!(
            tree.receivers_for(&contacts(&["alpha", "beta"])),
            vec!["alpha", "beta"]
        );
    }

    #[test]
    fn unknown_contact_falls_back_to_root() {
        let root = tree();
        let tree = RoutingTree::new(&root);
        assert_eq!(tree.receivers_for(&contacts(&["gamma"])), vec!["default"]);
    }

    #[test]
    fn first_non_continuing_match_stops_evaluation() {
        let mut root = tree();
        root.routes[0].continue_matching = false;
        let tree = RoutingTree::new(&root);
        assert_eq!(
            tree.receivers_for(&contacts(&["alpha", "beta"])),
            vec!["alpha"]
        );
    }
}
