use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::classfile::descriptor::is_method_descriptor;
use crate::{Rule, RuleSet, TransformTarget};

/// Group `rules` by class and pick the effective class-level rule for each
/// class.
///
/// Nothing here rejects a rule: inconsistent input only produces warnings.
pub(crate) fn compile(rules: Vec<Rule>) -> RuleSet {
    let mut by_class: HashMap<String, Vec<usize>> = HashMap::new();
    let mut class_rules: HashMap<String, usize> = HashMap::new();

    for (idx, rule) in rules.iter().enumerate() {
        let class_name = rule.target().class_name();
        by_class.entry(class_name.to_owned()).or_default().push(idx);

        if let TransformTarget::Class { .. } = rule.target() {
            match class_rules.entry(class_name.to_owned()) {
                Entry::Vacant(slot) => {
                    slot.insert(idx);
                }
                Entry::Occupied(first) => {
                    warn!(
                        class = class_name,
                        kept = %rules[*first.get()],
                        ignored = %rule,
                        "duplicate class access transform, keeping the first"
                    );
                }
            }
        }
    }

    check_member_duplicates(&rules);
    check_method_descriptors(&rules);

    RuleSet {
        rules,
        by_class,
        class_rules,
    }
}

/// Member rules are looked up by target, so a repeated target silently
/// shadows the earlier rule.
fn check_member_duplicates(rules: &[Rule]) {
    let mut seen = HashSet::new();
    for rule in rules.iter().rev() {
        if rule.target().member().is_some() && !seen.insert(rule.target()) {
            warn!(
                transform = %rule.target(),
                ignored = %rule,
                "duplicate member access transform, a later rule takes precedence"
            );
        }
    }
}

fn check_method_descriptors(rules: &[Rule]) {
    for rule in rules {
        let TransformTarget::Method { descriptor, .. } = rule.target() else {
            continue;
        };
        if rule.target().is_wildcard() {
            continue;
        }
        let valid = descriptor
            .find('(')
            .is_some_and(|paren| paren > 0 && is_method_descriptor(&descriptor[paren..]));
        if !valid {
            warn!(
                transform = %rule.target(),
                "method access transform has no valid JVM descriptor and will never match"
            );
        }
    }
}
