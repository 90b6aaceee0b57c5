use access_transformer::{AccessLevel, Modifier, ModifierEdit, Rule, RuleSet, RuleSetBuilder};
use proptest::prelude::*;

#[path = "support/mod.rs"]
pub mod support;

use support::{
    invoke, ClassBuilder, ACC_FINAL, ACC_PRIVATE, ACC_PROTECTED, ACC_PUBLIC, ACC_STATIC,
    ACC_SUPER, ALOAD_0, INVOKESPECIAL, RETURN,
};

// --- Fixed class schema ---
// eu/gen/Target         : the class under test
// fields  f0..f3 : I    : random flags
// methods m0..m3 ()V    : random flags, optionally self-recursive
// eu/gen/Target$Inner   : one inner-class entry
// plus <init>()V and <clinit>()V

pub const CLASS: &str = "eu/gen/Target";
pub const INNER: &str = "eu/gen/Target$Inner";
pub const FIELDS: &[&str] = &["f0", "f1", "f2", "f3"];
pub const METHODS: &[&str] = &["m0", "m1", "m2", "m3"];

/// Any of the four visibility levels.
pub fn arb_level() -> impl Strategy<Value = AccessLevel> {
    prop::sample::select(AccessLevel::ALL.to_vec())
}

/// Zero to two `final` edits.
pub fn arb_edits() -> impl Strategy<Value = Vec<ModifierEdit>> {
    prop::collection::vec(
        any::<bool>().prop_map(|add| {
            if add {
                ModifierEdit::add(Modifier::Final)
            } else {
                ModifierEdit::remove(Modifier::Final)
            }
        }),
        0..=2,
    )
}

/// A member access-flag word: one visibility, optionally static and final.
pub fn arb_flags() -> impl Strategy<Value = u16> {
    (arb_level(), any::<bool>(), any::<bool>()).prop_map(|(level, is_static, is_final)| {
        let mut flags = level.flag();
        if is_static {
            flags |= ACC_STATIC;
        }
        if is_final {
            flags |= ACC_FINAL;
        }
        flags
    })
}

/// A rule addressing some part of the fixed schema.
pub fn arb_rule() -> impl Strategy<Value = Rule> {
    let dotted = CLASS.replace('/', ".");
    let field_class = dotted.clone();
    let method_class = dotted.clone();
    let target = prop_oneof![
        Just(dotted.clone()),
        Just(INNER.replace('/', ".")),
        prop::sample::select(FIELDS).prop_map(move |f| format!("{field_class} {f}")),
        Just(format!("{dotted} *")),
        prop::sample::select(METHODS).prop_map(move |m| format!("{method_class} {m}()V")),
        Just(format!("{dotted} *()")),
        Just(format!("{dotted} <init>()V")),
        Just(format!("{dotted} <clinit>()V")),
        Just(format!(r"{dotted} f\#0")),
        Just(format!(r"{dotted} m\#0()V")),
        Just(format!(r"{dotted}\#Tag")),
    ];
    (arb_level(), arb_edits(), target).prop_map(|(level, edits, target)| {
        let mut spec = level.to_string();
        for edit in edits {
            spec.push_str(&edit.to_string());
        }
        access_transformer::parse::parse_line(&format!("{spec} {target}"))
            .expect("generated rule line should parse")
            .expect("generated rule line is not blank")
    })
}

/// A generated member of the fixed class.
#[derive(Debug, Clone)]
pub struct GenMethod {
    pub flags: u16,
    pub recursive: bool,
}

/// A generated class file configuration.
#[derive(Debug, Clone)]
pub struct GenClass {
    pub class_flags: u16,
    pub fields: Vec<u16>,
    pub methods: Vec<GenMethod>,
    pub inner_flags: u16,
}

impl GenClass {
    /// Assemble the class file.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut b = ClassBuilder::new(CLASS, self.class_flags);
        for (name, &flags) in FIELDS.iter().zip(&self.fields) {
            b.field(flags, name, "I");
        }
        for (name, method) in METHODS.iter().zip(&self.methods) {
            let mut code = vec![ALOAD_0];
            if method.recursive {
                let self_ref = b.method_ref(CLASS, name, "()V");
                code.extend(invoke(INVOKESPECIAL, self_ref));
            }
            code.push(RETURN);
            b.method(method.flags, name, "()V", Some(code));
        }
        let object_init = b.method_ref("java/lang/Object", "<init>", "()V");
        let mut init = vec![ALOAD_0];
        init.extend(invoke(INVOKESPECIAL, object_init));
        init.push(RETURN);
        b.method(ACC_PRIVATE, "<init>", "()V", Some(init));
        b.method(ACC_STATIC, "<clinit>", "()V", Some(vec![RETURN]));
        b.inner_class(INNER, Some(CLASS), Some("Inner"), self.inner_flags);
        b.build()
    }
}

pub fn arb_class() -> impl Strategy<Value = GenClass> {
    let class_flags = prop::sample::select(vec![ACC_SUPER, ACC_PUBLIC | ACC_SUPER]);
    let inner_flags = prop::sample::select(vec![
        ACC_PRIVATE | ACC_STATIC,
        ACC_PROTECTED,
        ACC_PUBLIC | ACC_STATIC,
        0,
    ]);
    let method = (arb_flags(), any::<bool>())
        .prop_map(|(flags, recursive)| GenMethod { flags, recursive });
    (
        class_flags,
        prop::collection::vec(arb_flags(), FIELDS.len()),
        prop::collection::vec(method, METHODS.len()),
        inner_flags,
    )
        .prop_map(|(class_flags, fields, methods, inner_flags)| GenClass {
            class_flags,
            fields,
            methods,
            inner_flags,
        })
}

/// 0..=8 rules over the fixed schema.
pub fn arb_ruleset() -> impl Strategy<Value = RuleSet> {
    prop::collection::vec(arb_rule(), 0..=8).prop_map(|rules| {
        RuleSetBuilder::new()
            .rules(rules)
            .build()
            .expect("programmatic rules always build")
    })
}
