use std::fmt;

/// Field name that matches every field of a class.
pub const FIELD_WILDCARD: &str = "*";

/// Method descriptor that matches every method of a class.
pub const METHOD_WILDCARD: &str = "*()";

/// Discriminant of a [`TransformTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetKind {
    Class,
    Field,
    Method,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Class => f.write_str("class"),
            TargetKind::Field => f.write_str("field"),
            TargetKind::Method => f.write_str("method"),
        }
    }
}

/// What a rule applies to.
///
/// Class names are stored in dotted form (`eu.mikroskeem.Foo`), regardless of
/// whether the rule was written with `.` or `/` separators. Method targets
/// store the method name immediately followed by its descriptor, e.g.
/// `<init>(I)V`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransformTarget {
    Class {
        class_name: String,
    },
    Field {
        class_name: String,
        name: String,
    },
    Method {
        class_name: String,
        descriptor: String,
    },
}

impl TransformTarget {
    #[must_use]
    pub fn class(class_name: &str) -> Self {
        TransformTarget::Class {
            class_name: normalize_class_name(class_name),
        }
    }

    #[must_use]
    pub fn field(class_name: &str, name: &str) -> Self {
        TransformTarget::Field {
            class_name: normalize_class_name(class_name),
            name: name.to_owned(),
        }
    }

    /// A method target. `descriptor` is the method name followed by its JVM
    /// method descriptor. Any descriptor whose name part is `*` collapses to
    /// [`METHOD_WILDCARD`].
    #[must_use]
    pub fn method(class_name: &str, descriptor: &str) -> Self {
        let descriptor = if descriptor.starts_with("*(") {
            METHOD_WILDCARD.to_owned()
        } else {
            descriptor.to_owned()
        };
        TransformTarget::Method {
            class_name: normalize_class_name(class_name),
            descriptor,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TargetKind {
        match self {
            TransformTarget::Class { .. } => TargetKind::Class,
            TransformTarget::Field { .. } => TargetKind::Field,
            TransformTarget::Method { .. } => TargetKind::Method,
        }
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        match self {
            TransformTarget::Class { class_name }
            | TransformTarget::Field { class_name, .. }
            | TransformTarget::Method { class_name, .. } => class_name,
        }
    }

    /// The field name or method descriptor, `None` for class targets.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        match self {
            TransformTarget::Class { .. } => None,
            TransformTarget::Field { name, .. } => Some(name),
            TransformTarget::Method { descriptor, .. } => Some(descriptor),
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        match self {
            TransformTarget::Class { .. } => false,
            TransformTarget::Field { name, .. } => name == FIELD_WILDCARD,
            TransformTarget::Method { descriptor, .. } => descriptor == METHOD_WILDCARD,
        }
    }
}

/// Rule-file text for `token`, with `#` escaped so it is not read back as a
/// comment.
fn write_token(f: &mut fmt::Formatter<'_>, token: &str) -> fmt::Result {
    let mut parts = token.split('#');
    if let Some(first) = parts.next() {
        f.write_str(first)?;
    }
    for part in parts {
        f.write_str("\\#")?;
        f.write_str(part)?;
    }
    Ok(())
}

impl fmt::Display for TransformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_token(f, self.class_name())?;
        if let Some(member) = self.member() {
            f.write_str(" ")?;
            write_token(f, member)?;
        }
        Ok(())
    }
}

/// Convert a class name written with `/` separators to dotted form.
#[must_use]
pub fn normalize_class_name(name: &str) -> String {
    name.replace('/', ".")
}
