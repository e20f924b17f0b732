use std::sync::LazyLock;

use regex::{Captures, Regex};

const MERGED_LABELS_HEADER: &str = "{{- $mergedLabels := mergeLabelValues $values -}}\n";

static LEGACY_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*([^}]+?)\s*\}").unwrap());
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

fn label_reference(name: &str) -> String {
    if IDENTIFIER.is_match(name) {
        format!("{{{{$mergedLabels.{name}}}}}")
    } else {
        format!("{{{{index $mergedLabels \"{name}\"}}}}")
    }
}

/// Rewrites legacy `${label}` interpolation into alert template syntax.
/// Messages without variables are returned unchanged.
pub fn migrate_message_template(message: &str) -> String {
    if !LEGACY_VARIABLE.is_match(message) {
        return message.to_string();
    }
    let body = LEGACY_VARIABLE.replace_all(message, |caps: &Captures| label_reference(&caps[1]));
    format!("{MERGED_LABELS_HEADER}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_is_untouched() {
        assert_eq!(migrate_message_template("message"), "message");
    }

    #[test]
    fn variables_become_merged_label_lookups() {
        let expected = "{{- $mergedLabels := mergeLabelValues $values -}}\n\
                        Instance {{$mergedLabels.instance}} is down";
        assert_eq!(
            migrate_message_template("Instance ${instance} is down"),
            expected
        );
    }

    #[test]
    fn non_identifier_labels_use_index() {
        let out = migrate_message_template("Host ${host-name}");
        assert!(out.ends_with("Host {{index $mergedLabels \"host-name\"}}"));
    }
}
