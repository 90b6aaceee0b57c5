use std::borrow::Cow;
use std::collections::HashMap;

use crate::{MergeError, Rule, RuleSet, TransformTarget, FIELD_WILDCARD, METHOD_WILDCARD};
use crate::types::normalize_class_name;

/// Rule lookup for one class, built when the class is visited and dropped
/// afterwards.
///
/// Field rules are keyed by field name, method rules by name plus
/// descriptor. The wildcard keys `*` and `*()` are stored like any other
/// key and layered under exact matches at lookup time.
#[derive(Debug, Clone)]
pub struct RuleIndex<'r> {
    rules: &'r RuleSet,
    class_name: String,
    class_rule: Option<&'r Rule>,
    fields: HashMap<&'r str, &'r Rule>,
    methods: HashMap<&'r str, &'r Rule>,
}

impl<'r> RuleIndex<'r> {
    /// Index the rules of `rules` that name `class_name`. The name may use
    /// `/` or `.` separators.
    #[must_use]
    pub fn build(rules: &'r RuleSet, class_name: &str) -> Self {
        let class_name = normalize_class_name(class_name);
        let mut fields = HashMap::new();
        let mut methods = HashMap::new();

        for rule in rules.rules_for_class(&class_name) {
            match rule.target() {
                TransformTarget::Field { name, .. } => {
                    fields.insert(name.as_str(), rule);
                }
                TransformTarget::Method { descriptor, .. } => {
                    methods.insert(descriptor.as_str(), rule);
                }
                TransformTarget::Class { .. } => {}
            }
        }

        Self {
            rules,
            class_rule: rules.class_rule(&class_name),
            class_name,
            fields,
            methods,
        }
    }

    /// Dotted name of the indexed class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn class_rule(&self) -> Option<&'r Rule> {
        self.class_rule
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.class_rule.is_none() && self.fields.is_empty() && self.methods.is_empty()
    }

    /// The rule that applies to field `name`, layering an exact rule over
    /// the `*` rule when both exist.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] if the two rules cannot be merged.
    pub fn resolve_field(&self, name: &str) -> Result<Option<Cow<'r, Rule>>, MergeError> {
        layer(self.fields.get(FIELD_WILDCARD), self.fields.get(name))
    }

    /// The rule that applies to method `name` with JVM descriptor
    /// `descriptor`, layering an exact rule over the `*()` rule.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] if the two rules cannot be merged.
    pub fn resolve_method(
        &self,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<Cow<'r, Rule>>, MergeError> {
        let key = format!("{name}{descriptor}");
        layer(self.methods.get(METHOD_WILDCARD), self.methods.get(key.as_str()))
    }

    /// The class-level rule for an inner (or outer) class named in the
    /// `InnerClasses` table.
    ///
    /// Inner classes are classes of their own, so the lookup covers every
    /// rule in the set and not just those naming the indexed class.
    #[must_use]
    pub fn resolve_inner_or_outer_class(&self, binary_name: &str) -> Option<&'r Rule> {
        self.rules.class_rule(binary_name)
    }
}

fn layer<'r>(
    wildcard: Option<&&'r Rule>,
    exact: Option<&&'r Rule>,
) -> Result<Option<Cow<'r, Rule>>, MergeError> {
    match (wildcard, exact) {
        (Some(wildcard), Some(exact)) => wildcard.merge_wildcard(exact).map(|r| Some(Cow::Owned(r))),
        (Some(only), None) | (None, Some(only)) => Ok(Some(Cow::Borrowed(*only))),
        (None, None) => Ok(None),
    }
}
