mod support;

use access_transformer::classfile::ClassFile;
use access_transformer::{
    AccessLevel, Element, Modifier, ModifierEdit, Rule, RuleSet, RuleSetBuilder,
};
use support::*;

#[test]
fn empty_ruleset_returns_input() {
    let input = ClassBuilder::new("a/B", ACC_SUPER).build();
    let set = RuleSetBuilder::new().build().unwrap();
    assert_eq!(set.transform_class(&input).unwrap(), input);
}

#[test]
fn class_with_no_members() {
    let input = ClassBuilder::new("a/Empty", ACC_SUPER).build();
    let set = RuleSet::from_text("public a.Empty *\npublic a.Empty *()\n").unwrap();
    let report = set.transform_class_detailed(&input).unwrap();
    assert!(report.is_unchanged());
}

#[test]
fn duplicate_class_rules_first_wins() {
    let input = ClassBuilder::new("a/B", ACC_SUPER).build();
    let set = RuleSet::from_text("protected a.B\npublic a.B\n").unwrap();
    assert_eq!(set.class_rule("a.B").unwrap().level(), AccessLevel::Protected);

    let out = set.transform_class(&input).unwrap();
    assert_eq!(ClassFile::parse(&out).unwrap().access_flags(), ACC_PROTECTED | ACC_SUPER);
}

#[test]
fn duplicate_member_rules_last_wins() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.field(ACC_PRIVATE | ACC_FINAL, "x", "I");
    let input = b.build();

    let set = RuleSet::from_text("protected a.B x\npublic-f a.B x\n").unwrap();
    let out = set.transform_class(&input).unwrap();
    assert_eq!(ClassFile::parse(&out).unwrap().fields()[0].access_flags, ACC_PUBLIC);
}

#[test]
fn rules_for_other_classes_ignored() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.field(ACC_PRIVATE, "x", "I");
    let input = b.build();

    let set = RuleSet::from_text("public a.C x\npublic a.Bx x\npublic a x\n").unwrap();
    assert_eq!(set.transform_class(&input).unwrap(), input);
}

#[test]
fn method_rule_matches_exact_descriptor_only() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.method(ACC_PRIVATE, "m", "(I)V", Some(vec![RETURN]));
    b.method(ACC_PRIVATE, "m", "(J)V", Some(vec![RETURN]));
    let input = b.build();

    let set = RuleSet::from_text("public a.B m(I)V").unwrap();
    let class_out = set.transform_class(&input).unwrap();
    let class = ClassFile::parse(&class_out).unwrap();
    assert_eq!(class.methods()[0].access_flags, ACC_PUBLIC);
    assert_eq!(class.methods()[1].access_flags, ACC_PRIVATE);
}

#[test]
fn field_rule_does_not_match_method_of_same_name() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.method(ACC_PRIVATE, "x", "()V", Some(vec![RETURN]));
    let input = b.build();
    let set = RuleSet::from_text("public a.B x").unwrap();
    assert_eq!(set.transform_class(&input).unwrap(), input);
}

#[test]
fn add_final_without_level_change() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.field(ACC_PUBLIC, "x", "I");
    let input = b.build();
    let set = RuleSet::from_text("public+f a.B x").unwrap();
    let report = set.transform_class_detailed(&input).unwrap();
    assert_eq!(report.changes()[0].new_flags, ACC_PUBLIC | ACC_FINAL);
    assert!(report.denied_downgrades().is_empty());
}

#[test]
fn final_edit_on_class_rule() {
    let input = ClassBuilder::new("a/B", ACC_PUBLIC | ACC_SUPER | ACC_FINAL).build();
    let set = RuleSetBuilder::new()
        .rule(
            Rule::class("a.B", AccessLevel::Public)
                .with_edit(ModifierEdit::remove(Modifier::Final)),
        )
        .build()
        .unwrap();
    let out = set.transform_class(&input).unwrap();
    assert_eq!(ClassFile::parse(&out).unwrap().access_flags(), ACC_PUBLIC | ACC_SUPER);
}

#[test]
fn constructor_denied_downgrade_is_reported() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.method(ACC_PUBLIC, "<init>", "()V", Some(vec![RETURN]));
    let input = b.build();
    let report = RuleSet::from_text("private a.B <init>()V")
        .unwrap()
        .transform_class_detailed(&input)
        .unwrap();
    assert_eq!(report.bytes(), &input[..]);
    assert_eq!(
        report.denied_downgrades()[0].element,
        Element::Method("<init>()V".into())
    );
}

#[test]
fn constructor_ignores_final_edits() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.method(ACC_PRIVATE, "<init>", "()V", Some(vec![RETURN]));
    let input = b.build();
    let out = RuleSet::from_text("public+f a.B <init>()V")
        .unwrap()
        .transform_class(&input)
        .unwrap();
    assert_eq!(ClassFile::parse(&out).unwrap().methods()[0].access_flags, ACC_PUBLIC);
}

#[test]
fn multiple_self_calls_in_one_body() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    let me = b.method_ref("a/B", "loop", "(I)I");
    let other = b.method_ref("a/B", "loop", "(J)I");
    let mut code = vec![ALOAD_0, ICONST_0];
    code.extend(invoke(INVOKESPECIAL, me));
    code.push(ALOAD_0);
    code.extend(invoke(INVOKESPECIAL, other));
    code.push(ALOAD_0);
    code.push(ICONST_0);
    code.extend(invoke(INVOKESPECIAL, me));
    code.push(IRETURN);
    b.method(ACC_PRIVATE, "loop", "(I)I", Some(code));
    let input = b.build();

    let report = RuleSet::from_text("protected a.B loop(I)I")
        .unwrap()
        .transform_class_detailed(&input)
        .unwrap();
    let pcs: Vec<usize> = report.rewritten_calls().iter().map(|c| c.pc).collect();
    assert_eq!(pcs, vec![2, 11]);

    let class = ClassFile::parse(report.bytes()).unwrap();
    let code = class.code(&class.methods()[0]).unwrap();
    assert_eq!(code[2], INVOKEVIRTUAL);
    assert_eq!(code[6], INVOKESPECIAL);
    assert_eq!(code[11], INVOKEVIRTUAL);
}

#[test]
fn static_call_with_same_signature_untouched() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    let me = b.method_ref("a/B", "m", "()V");
    let mut code = invoke(INVOKESTATIC, me).to_vec();
    code.push(RETURN);
    b.method(ACC_PRIVATE | ACC_STATIC, "m", "()V", Some(code));
    let input = b.build();

    let report = RuleSet::from_text("public a.B m()V")
        .unwrap()
        .transform_class_detailed(&input)
        .unwrap();
    assert!(report.rewritten_calls().is_empty());
    assert_eq!(diff_offsets(&input, report.bytes()).len(), 1);
}

#[test]
fn anonymous_inner_class_entry() {
    let mut b = ClassBuilder::new("a/B", ACC_SUPER);
    b.inner_class("a/B$1", None, None, 0);
    let input = b.build();
    let out = RuleSet::from_text("public a.B$1")
        .unwrap()
        .transform_class(&input)
        .unwrap();
    assert_eq!(
        ClassFile::parse(&out).unwrap().inner_classes()[0].access_flags,
        ACC_PUBLIC
    );
}

#[test]
fn inner_class_transformed_as_its_own_class() {
    let input = ClassBuilder::new("a/B$Inner", ACC_SUPER).build();
    let out = RuleSet::from_text("public a/B$Inner")
        .unwrap()
        .transform_class(&input)
        .unwrap();
    assert_eq!(ClassFile::parse(&out).unwrap().access_flags(), ACC_PUBLIC | ACC_SUPER);
}

#[test]
fn many_rules_for_one_class() {
    let mut b = ClassBuilder::new("a/Big", ACC_SUPER);
    let mut text = String::new();
    for i in 0..200 {
        b.field(ACC_PRIVATE, &format!("f{i}"), "I");
        if i % 2 == 0 {
            text.push_str(&format!("public a.Big f{i}\n"));
        }
    }
    let input = b.build();
    let report = RuleSet::from_text(&text)
        .unwrap()
        .transform_class_detailed(&input)
        .unwrap();
    assert_eq!(report.changes().len(), 100);
}
