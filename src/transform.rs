use std::time::Instant;

use tracing::debug;

use crate::classfile::{ClassFile, ClassVisitor, FieldInfo, InnerClassInfo, MethodInfo};
use crate::index::RuleIndex;
use crate::patch::{rewrite_self_calls, SelfCall};
use crate::policy::{self, Override};
use crate::types::{
    DeniedDowngrade, Element, FlagChange, RewrittenCall, TransformReport, ACC_PRIVATE,
};
use crate::{Rule, RuleSet, TransformError};

const STATIC_INITIALIZER: &str = "<clinit>";
const CONSTRUCTOR: &str = "<init>";

/// Transform one class file against `rules`.
pub(crate) fn transform(rules: &RuleSet, bytes: &[u8]) -> Result<TransformReport, TransformError> {
    let start = Instant::now();
    let class = ClassFile::parse(bytes)?;
    let mut transformer = ClassTransformer::new(rules, class.name());

    let output = if transformer.index.is_empty() && !has_inner_class_rules(rules, &class) {
        bytes.to_vec()
    } else {
        class.accept(&mut transformer)?
    };

    Ok(TransformReport::new(
        class.name().to_owned(),
        output,
        transformer.changes,
        transformer.denied,
        transformer.rewritten_calls,
        start.elapsed(),
    ))
}

fn has_inner_class_rules(rules: &RuleSet, class: &ClassFile<'_>) -> bool {
    class
        .inner_classes()
        .iter()
        .any(|inner| rules.class_rule(&inner.inner_class).is_some())
}

/// Per-class visitor state. Lives for exactly one class.
struct ClassTransformer<'r> {
    index: RuleIndex<'r>,
    changes: Vec<FlagChange>,
    denied: Vec<DeniedDowngrade>,
    rewritten_calls: Vec<RewrittenCall>,
}

impl<'r> ClassTransformer<'r> {
    fn new(rules: &'r RuleSet, class_name: &str) -> Self {
        Self {
            index: RuleIndex::build(rules, class_name),
            changes: Vec::new(),
            denied: Vec::new(),
            rewritten_calls: Vec::new(),
        }
    }

    /// Log and record the outcome of one policy decision.
    fn record(&mut self, class: &ClassFile<'_>, element: Element, old_flags: u16, result: Override) {
        if let Some(downgrade) = result.denied {
            debug!(
                class = class.name(),
                %element,
                current = %downgrade.current,
                requested = %downgrade.requested,
                "denied access downgrade"
            );
            self.denied.push(DeniedDowngrade {
                element: element.clone(),
                downgrade,
            });
        }
        if result.flags != old_flags {
            debug!(
                class = class.name(),
                %element,
                old_flags = format_args!("{old_flags:#06x}"),
                new_flags = format_args!("{:#06x}", result.flags),
                "applied access transform"
            );
            self.changes.push(FlagChange {
                element,
                old_flags,
                new_flags: result.flags,
            });
        }
    }

    fn error(class: &ClassFile<'_>, kind: impl Into<crate::TransformErrorKind>) -> TransformError {
        TransformError::new(Some(class.name()), kind)
    }
}

impl ClassVisitor for ClassTransformer<'_> {
    type Error = TransformError;

    fn visit_class(&mut self, class: &ClassFile<'_>) -> Result<u16, TransformError> {
        let flags = class.access_flags();
        let result = policy::override_access(flags, self.index.class_rule());
        self.record(class, Element::Class, flags, result);
        Ok(result.flags)
    }

    fn visit_field(
        &mut self,
        class: &ClassFile<'_>,
        field: &FieldInfo<'_>,
    ) -> Result<u16, TransformError> {
        let rule = self
            .index
            .resolve_field(&field.name)
            .map_err(|e| Self::error(class, e))?;
        let result = policy::override_access(field.access_flags, rule.as_deref());
        self.record(
            class,
            Element::Field(field.name.to_string()),
            field.access_flags,
            result,
        );
        Ok(result.flags)
    }

    fn visit_method(
        &mut self,
        class: &ClassFile<'_>,
        method: &MethodInfo<'_>,
        code: Option<&mut [u8]>,
    ) -> Result<u16, TransformError> {
        if method.name == STATIC_INITIALIZER {
            return Ok(method.access_flags);
        }

        let rule = self
            .index
            .resolve_method(&method.name, &method.descriptor)
            .map_err(|e| Self::error(class, e))?;
        let Some(rule) = rule else {
            return Ok(method.access_flags);
        };

        let old_flags = method.access_flags;
        let element = Element::Method(method.signature());

        if method.name == CONSTRUCTOR {
            let result = policy::override_level(old_flags, rule.level());
            self.record(class, element, old_flags, result);
            return Ok(result.flags);
        }

        let result = policy::override_access(old_flags, Some(&*rule));
        self.record(class, element, old_flags, result);

        if is_private(old_flags) && !is_private(result.flags) {
            if let Some(code) = code {
                self.patch(class, method, &rule, code)?;
            }
        }
        Ok(result.flags)
    }

    fn visit_inner_class(
        &mut self,
        class: &ClassFile<'_>,
        inner: &InnerClassInfo<'_>,
    ) -> Result<u16, TransformError> {
        let rule = self.index.resolve_inner_or_outer_class(&inner.inner_class);
        let result = policy::override_access(inner.access_flags, rule);
        self.record(
            class,
            Element::InnerClass(inner.inner_class.to_string()),
            inner.access_flags,
            result,
        );
        Ok(result.flags)
    }
}

impl ClassTransformer<'_> {
    fn patch(
        &mut self,
        class: &ClassFile<'_>,
        method: &MethodInfo<'_>,
        rule: &Rule,
        code: &mut [u8],
    ) -> Result<(), TransformError> {
        let target = SelfCall {
            owner: class.name(),
            name: &method.name,
            descriptor: &method.descriptor,
        };
        let pcs = rewrite_self_calls(code, class.constant_pool(), target)
            .map_err(|e| Self::error(class, e))?;
        if !pcs.is_empty() {
            debug!(
                class = class.name(),
                rule = %rule,
                calls = pcs.len(),
                "made private method overridable, patched self-calls"
            );
        }
        let signature = method.signature();
        let base = method.code_offset().unwrap_or_default();
        self.rewritten_calls.extend(pcs.into_iter().map(|pc| RewrittenCall {
            method: signature.clone(),
            pc,
            offset: base + pc,
        }));
        Ok(())
    }
}

fn is_private(flags: u16) -> bool {
    flags & ACC_PRIVATE != 0
}
