use cxxbind_ast::{Access, BaseSpecifier, ClassItem};
use cxxbind_meta::{BuildOptions, FunctionAttributes, FunctionKind};
use cxxbind_tests::{dump_functions, method, pure_virtual_method, virtual_method, ModelFixture};
use cxxbind_typesystem::TypeEntry;
use smol_str::SmolStr;

fn base_derived_fixture() -> ModelFixture {
    let mut base = ClassItem::named("Base");
    base.functions.push(pure_virtual_method("f", "int", &[]));

    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));
    let mut f = virtual_method("f", "int", &[]);
    f.is_override = true;
    derived.functions.push(f);

    ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
}

#[test]
fn pure_virtual_override() {
    let result = base_derived_fixture().build_ok();

    let base = result.find_class("Base").unwrap();
    assert!(base.is_abstract());

    let derived = result.find_class("Derived").unwrap();
    assert!(!derived.is_abstract());

    let fs: Vec<_> = derived.find_functions("f").collect();
    assert_eq!(fs.len(), 1, "exactly one `f` on Derived");
    let f = fs[0];
    assert!(f.attributes.contains(FunctionAttributes::OVERRIDE));
    assert!(!f.is_abstract());
    // Declaring class tracks where the virtual was introduced.
    let declaring = f.declaring_class.unwrap();
    assert_eq!(result.arena().get(declaring).qualified_name, "Base");
}

#[test]
fn abstract_base_function_propagates_when_not_overridden() {
    let mut base = ClassItem::named("Base");
    base.functions.push(pure_virtual_method("f", "int", &[]));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived = result.find_class("Derived").unwrap();
    assert!(derived.is_abstract(), "unoverridden pure virtual keeps the class abstract");
    let f = derived.find_functions("f").next().unwrap();
    assert!(f.is_propagated());
    assert!(f.is_abstract());
    // Implementing class stays the base that provides the code.
    assert_eq!(
        result.arena().get(f.implementing_class.unwrap()).qualified_name,
        "Base"
    );
}

fn diamond_fixture() -> ModelFixture {
    let mut root = ClassItem::named("Root");
    root.functions.push(virtual_method("ping", "void", &[]));

    let mut left = ClassItem::named("Left");
    left.bases.push(BaseSpecifier::public("Root"));
    let mut over = virtual_method("ping", "void", &[]);
    over.is_override = true;
    left.functions.push(over);

    let mut right = ClassItem::named("Right");
    right.bases.push(BaseSpecifier::public("Root"));

    let mut bottom = ClassItem::named("Bottom");
    bottom.bases.push(BaseSpecifier::public("Left"));
    bottom.bases.push(BaseSpecifier::public("Right"));

    ModelFixture::new()
        .entry(TypeEntry::object("Root"))
        .entry(TypeEntry::object("Left"))
        .entry(TypeEntry::object("Right"))
        .entry(TypeEntry::object("Bottom"))
        .class(root)
        .class(left)
        .class(right)
        .class(bottom)
}

#[test]
fn diamond_fix_functions_deterministic() {
    let first = diamond_fixture().build_ok();
    let second = diamond_fixture().build_ok();
    for name in ["Root", "Left", "Right", "Bottom"] {
        assert_eq!(
            dump_functions(&first, name),
            dump_functions(&second, name),
            "function lists for {name} must be identical across runs"
        );
    }
}

#[test]
fn diamond_override_resolved_once() {
    let result = diamond_fixture().build_ok();
    let bottom = result.find_class("Bottom").unwrap();
    let pings: Vec<_> = bottom.find_functions("ping").collect();
    assert_eq!(pings.len(), 1, "diamond must not duplicate the virtual");
    let ping = pings[0];
    assert!(ping.is_propagated());
    // The middle override is the implementation Bottom sees.
    assert_eq!(
        result.arena().get(ping.implementing_class.unwrap()).qualified_name,
        "Left"
    );
    assert_eq!(
        result.arena().get(ping.declaring_class.unwrap()).qualified_name,
        "Root"
    );
}

#[test]
fn private_override_of_abstract_becomes_empty_final() {
    let mut base = ClassItem::named("Base");
    base.functions.push(pure_virtual_method("work", "void", &[]));

    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));
    let mut over = virtual_method("work", "void", &[]);
    over.is_override = true;
    over.access = Access::Private;
    derived.functions.push(over);

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived = result.find_class("Derived").unwrap();
    assert!(!derived.is_abstract(), "the empty override keeps the class concrete");
    let work = derived.find_functions("work").next().unwrap();
    assert_eq!(work.kind, FunctionKind::Empty);
    assert!(work.is_final_in_target_lang());
    // The narrowing is warned about, not silently accepted.
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| matches!(d.kind, cxxbind_diag::BuildDiagKind::VisibilityNarrowed { .. })));
}

#[test]
fn non_virtual_functions_propagate_as_copies() {
    let mut base = ClassItem::named("Base");
    base.functions.push(method("helper", "int", &[("x", "int")]));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived = result.find_class("Derived").unwrap();
    let helper = derived.find_functions("helper").next().unwrap();
    assert!(helper.is_propagated());
    assert!(!helper.attributes.contains(FunctionAttributes::OVERRIDE));
}

#[test]
fn shadowing_same_name_different_arguments_blocks_propagation() {
    let mut base = ClassItem::named("Base");
    base.functions.push(method("run", "void", &[("x", "int")]));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));
    derived
        .functions
        .push(method("run", "void", &[("x", "double")]));

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived = result.find_class("Derived").unwrap();
    let runs: Vec<_> = derived.find_functions("run").collect();
    assert_eq!(runs.len(), 1, "the shadowed base overload stays out");
    assert!(!runs[0].is_propagated());
}

#[test]
fn unresolved_base_falls_back_to_default_superclass() {
    let root = ClassItem::named("Root");
    let mut lost = ClassItem::named("Lost");
    lost.bases.push(BaseSpecifier::public("MissingBase"));

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Root"))
        .entry(TypeEntry::object("Lost"))
        .class(root)
        .class(lost)
        .options(BuildOptions {
            default_superclass: Some(SmolStr::new("Root")),
            ..BuildOptions::default()
        })
        .build_ok();

    let lost = result.find_class("Lost").unwrap();
    let root_id = result.arena().find_by_qualified_name("Root").unwrap();
    assert_eq!(lost.base_classes, vec![root_id]);
    assert_eq!(lost.default_superclass, Some(root_id));
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| matches!(d.kind, cxxbind_diag::BuildDiagKind::UnresolvedBaseClass { .. })));
}

#[test]
fn final_base_class_is_definalized_with_warning() {
    let mut sealed = ClassItem::named("Sealed");
    sealed.is_final = true;
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Sealed"));

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Sealed"))
        .entry(TypeEntry::object("Derived"))
        .class(sealed)
        .class(derived)
        .build_ok();

    let sealed = result.find_class("Sealed").unwrap();
    assert!(!sealed.is_final_in_target_lang());
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| matches!(d.kind, cxxbind_diag::BuildDiagKind::FinalClassExtended { .. })));
}

#[test]
fn using_constructors_synthesized_when_derived_declares_none() {
    let mut base = ClassItem::named("Base");
    base.functions
        .push(cxxbind_tests::constructor("Base", &[("x", "int")]));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));
    derived.using_declarations.push(cxxbind_ast::UsingItem {
        base_class: SmolStr::new("Base"),
        member: SmolStr::new("Base"),
        access: Access::Public,
    });

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived = result.find_class("Derived").unwrap();
    let ctor = derived
        .functions
        .iter()
        .find(|f| f.is_constructor())
        .expect("using-constructor synthesized");
    assert_eq!(ctor.name, "Derived");
    assert_eq!(ctor.arguments.len(), 1);
    assert!(ctor.attributes.contains(FunctionAttributes::SYNTHESIZED));
}

#[test]
fn using_constructors_skipped_when_derived_declares_one() {
    let mut base = ClassItem::named("Base");
    base.functions
        .push(cxxbind_tests::constructor("Base", &[("x", "int")]));
    let mut derived = ClassItem::named("Derived");
    derived.bases.push(BaseSpecifier::public("Base"));
    derived
        .functions
        .push(cxxbind_tests::constructor("Derived", &[("y", "double")]));
    derived.using_declarations.push(cxxbind_ast::UsingItem {
        base_class: SmolStr::new("Base"),
        member: SmolStr::new("Base"),
        access: Access::Public,
    });

    let result = ModelFixture::new()
        .entry(TypeEntry::object("Base"))
        .entry(TypeEntry::object("Derived"))
        .class(base)
        .class(derived)
        .build_ok();

    let derived = result.find_class("Derived").unwrap();
    let ctors: Vec<_> = derived
        .functions
        .iter()
        .filter(|f| f.is_constructor())
        .collect();
    assert_eq!(ctors.len(), 1, "ambiguity avoided: only the declared constructor");
    assert_eq!(ctors[0].arguments[0].name, "y");
}
