use cxxbind_ast::{Access, ArgumentItem, BaseSpecifier, ClassItem, TypeInfo, VariableItem};
use cxxbind_meta::FunctionAttributes;
use cxxbind_tests::{constructor, ModelFixture};
use cxxbind_typesystem::TypeEntry;

#[test]
fn implicit_default_constructibility_is_transitive() {
    let mut base = ClassItem::named("Base");
    base.fields
        .push(VariableItem::new("n", TypeInfo::parse("int").unwrap()));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));
    derived
        .fields
        .push(VariableItem::new("m", TypeInfo::parse("double").unwrap()));

    let result = ModelFixture::new()
        .entry(TypeEntry::value("Base"))
        .entry(TypeEntry::value("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived_id = result.arena().find_by_qualified_name("Derived").unwrap();
    assert!(result.arena().is_implicitly_default_constructible(derived_id));
}

#[test]
fn reference_field_flips_constructibility() {
    let mut base = ClassItem::named("Base");
    base.fields
        .push(VariableItem::new("r", TypeInfo::parse("int &").unwrap()));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));

    let result = ModelFixture::new()
        .entry(TypeEntry::value("Base"))
        .entry(TypeEntry::value("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let base_id = result.arena().find_by_qualified_name("Base").unwrap();
    let derived_id = result.arena().find_by_qualified_name("Derived").unwrap();
    assert!(!result.arena().is_implicitly_default_constructible(base_id));
    assert!(
        !result.arena().is_implicitly_default_constructible(derived_id),
        "the base's reference field must flip the derived answer"
    );
}

#[test]
fn default_constructor_synthesized_when_rules_allow() {
    let plain = ClassItem::named("Plain");

    let result = ModelFixture::new()
        .entry(TypeEntry::value("Plain").with_default_constructors())
        .class(plain)
        .build_ok();

    let plain = result.find_class("Plain").unwrap();
    let ctors: Vec<_> = plain
        .functions
        .iter()
        .filter(|f| f.is_constructor())
        .collect();
    assert_eq!(ctors.len(), 2, "default and copy constructors synthesized");
    assert!(ctors
        .iter()
        .all(|f| f.attributes.contains(FunctionAttributes::SYNTHESIZED)));
}

#[test]
fn no_synthesis_without_rule_permission() {
    let result = ModelFixture::new()
        .entry(TypeEntry::value("Plain"))
        .class(ClassItem::named("Plain"))
        .build_ok();

    let plain = result.find_class("Plain").unwrap();
    assert!(plain.functions.iter().all(|f| !f.is_constructor()));
}

#[test]
fn private_copy_constructor() {
    // End-to-end: a private copy constructor wins over the rule that
    // asks for synthesized constructors.
    let mut a = ClassItem::named("A");
    let mut copy = constructor("A", &[]);
    copy.arguments.push(ArgumentItem::new(
        "other",
        TypeInfo::parse("const A &").unwrap(),
    ));
    copy.access = Access::Private;
    a.functions.push(copy);

    let result = ModelFixture::new()
        .entry(TypeEntry::value("A").with_default_constructors())
        .class(a)
        .build_ok();

    let a_id = result.arena().find_by_qualified_name("A").unwrap();
    let a = result.arena().get(a_id);
    assert!(a.has_private_copy_constructor());
    assert!(!result.arena().is_copy_constructible(a_id));
    // The rule asked for synthesized constructors; the declaration
    // wins, so no public copy constructor may appear.
    assert!(
        !a.functions
            .iter()
            .any(|f| f.is_copy_constructor() && f.access == Access::Public),
        "no synthetic public copy constructor"
    );
}

#[test]
fn deleted_constructor_blocks_synthesis() {
    let mut a = ClassItem::named("A");
    let mut ctor = constructor("A", &[]);
    ctor.is_deleted = true;
    a.functions.push(ctor);

    let result = ModelFixture::new()
        .entry(TypeEntry::value("A").with_default_constructors())
        .class(a)
        .build_ok();

    let a = result.find_class("A").unwrap();
    assert!(
        a.functions.iter().all(|f| !f.is_constructor()),
        "a deleted constructor suppresses synthesized ones"
    );
    assert!(a
        .attributes
        .contains(cxxbind_meta::ClassAttributes::HAS_REJECTED_CONSTRUCTOR));
}

#[test]
fn private_only_constructors_make_class_abstract() {
    let mut singleton = ClassItem::named("Singleton");
    let mut ctor = constructor("Singleton", &[]);
    ctor.access = Access::Private;
    singleton.functions.push(ctor);

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Singleton"))
        .class(singleton)
        .build_ok();

    let singleton = result.find_class("Singleton").unwrap();
    assert!(singleton.is_abstract());
}
