use cxxbind_ast::{BaseSpecifier, ClassItem, TemplateParameterItem, TypeInfo, VariableItem};
use cxxbind_meta::TypeUsagePattern;
use cxxbind_tests::{method, ModelFixture};
use cxxbind_typesystem::{ContainerKind, SmartPointerKind, TypeEntry};

fn box_template() -> ClassItem {
    let mut type_box = ClassItem::named("Box");
    type_box
        .template_parameters
        .push(TemplateParameterItem::new("T", 0));
    type_box.fields.push(VariableItem::new(
        "value",
        TypeInfo::parse("T").unwrap(),
    ));
    type_box.functions.push(method("get", "T", &[]));
    type_box
        .functions
        .push(method("set", "void", &[("value", "const T &")]));
    type_box
}

fn template_fixture() -> ModelFixture {
    ModelFixture::new()
        .entry(TypeEntry::container("Box", ContainerKind::Sequence))
        .entry(TypeEntry::template_argument("Box::T", 0))
        .entry(TypeEntry::value("Foo"))
        .entry(TypeEntry::object("IntBox"))
        .entry(TypeEntry::object("FooBox"))
        .entry(TypeEntry::object("Holder"))
        .class(box_template())
        .class(ClassItem::named("Foo"))
        .class({
            let mut c = ClassItem::named("IntBox");
            c.bases.push(BaseSpecifier::public("Box<int>"));
            c
        })
        .class({
            let mut c = ClassItem::named("FooBox");
            c.bases.push(BaseSpecifier::public("Box<Foo>"));
            c
        })
        .class({
            let mut holder = ClassItem::named("Holder");
            holder.functions.push(method("ints", "Box<int>", &[]));
            holder
                .functions
                .push(method("store", "void", &[("boxed", "const Box<Foo> &")]));
            holder
                .functions
                .push(method("again", "void", &[("boxed", "Box<int>")]));
            holder
        })
}

#[test]
fn two_instantiations() {
    let result = template_fixture().build_ok();

    // Exactly two specializations of Box exist.
    let specializations: Vec<_> = result
        .classes()
        .filter(|c| c.is_template_specialization())
        .collect();
    assert_eq!(specializations.len(), 2);

    let int_box = result.find_class("Box<int>").expect("Box<int> specialized");
    let foo_box = result.find_class("Box<Foo>").expect("Box<Foo> specialized");

    // T substituted consistently through fields and methods.
    for (class, expected) in [(int_box, TypeUsagePattern::Primitive), (foo_box, TypeUsagePattern::Value)] {
        let field = class.find_field("value").expect("field kept");
        assert_eq!(field.ty.usage_pattern(), expected);
        let get = class.find_functions("get").next().expect("get kept");
        assert_eq!(get.return_type.usage_pattern(), expected);
        let set = class.find_functions("set").next().expect("set kept");
        assert!(set.arguments[0].ty.is_constant());
        assert_eq!(set.arguments[0].ty.usage_pattern(), expected);
    }

    // Collection pass lists both canonical signatures exactly once,
    // despite `Box<int>` appearing in two signatures.
    let containers = result.instantiated_containers();
    assert_eq!(containers.len(), 2);
}

#[test]
fn duplicate_instantiation_reuses_specialization() {
    // Two classes deriving from the same instantiation share it.
    let mut a = ClassItem::named("A");
    a.bases.push(BaseSpecifier::public("Box<int>"));
    let mut b = ClassItem::named("B");
    b.bases.push(BaseSpecifier::public("Box<int>"));

    let result = ModelFixture::new()
        .entry(TypeEntry::container("Box", ContainerKind::Sequence))
        .entry(TypeEntry::template_argument("Box::T", 0))
        .entry(TypeEntry::object("A"))
        .entry(TypeEntry::object("B"))
        .class(box_template())
        .class(a)
        .class(b)
        .build_ok();

    let specializations: Vec<_> = result
        .classes()
        .filter(|c| c.is_template_specialization())
        .collect();
    assert_eq!(specializations.len(), 1);

    let a = result.find_class("A").unwrap();
    let b = result.find_class("B").unwrap();
    assert_eq!(a.base_classes, b.base_classes);
}

#[test]
fn template_class_itself_is_not_emitted() {
    let result = template_fixture().build_ok();
    assert!(
        !result.classes().any(|c| c.qualified_name == "Box"),
        "the unbound template never reaches the ordered class list"
    );
    assert!(result
        .template_classes()
        .any(|c| c.qualified_name == "Box"));
}

#[test]
fn smart_pointer_instantiations_deduplicate_by_canonical_pointee() {
    let mut holder = ClassItem::named("Holder");
    holder
        .functions
        .push(method("make", "SharedPtr<Foo>", &[]));
    holder.functions.push(method(
        "take",
        "void",
        &[("p", "const SharedPtr<Foo> &")],
    ));
    holder.functions.push(method(
        "peek",
        "void",
        &[("p", "SharedPtr<const Foo>")],
    ));

    let mut ptr = ClassItem::named("SharedPtr");
    ptr.template_parameters
        .push(TemplateParameterItem::new("T", 0));
    ptr.functions.push(method("get", "T *", &[]));

    let result = ModelFixture::new()
        .entry(TypeEntry::smart_pointer("SharedPtr", SmartPointerKind::Shared))
        .entry(TypeEntry::template_argument("SharedPtr::T", 0))
        .entry(TypeEntry::value("Foo"))
        .entry(TypeEntry::object("Holder"))
        .class(ptr)
        .class(ClassItem::named("Foo"))
        .class(holder)
        .build_ok();

    let pointers = result.instantiated_smart_pointers();
    assert_eq!(
        pointers.len(),
        1,
        "const/reference variants collapse into one canonical instantiation"
    );
    let smp = &pointers[0];
    assert!(!smp.ty.is_constant());
    assert!(!smp.ty.instantiations()[0].is_constant());
    let template = smp.smart_pointer_class.expect("template class resolved");
    assert_eq!(result.arena().get(template).qualified_name, "SharedPtr");
}

#[test]
fn unresolved_template_children_skipped_with_warning() {
    // A signature can still mention the unbound parameter through its
    // registered qualified name; such an instantiation is not
    // emittable and must be skipped with a warning, while the
    // concrete one is still collected.
    let mut user = ClassItem::named("User");
    user.functions
        .push(method("weird", "void", &[("b", "Box<Box::T>")]));
    user.functions.push(method("boxed", "Box<int>", &[]));

    let result = ModelFixture::new()
        .entry(TypeEntry::container("Box", ContainerKind::Sequence))
        .entry(TypeEntry::template_argument("Box::T", 0))
        .entry(TypeEntry::object("User"))
        .class(box_template())
        .class(user)
        .build_ok();

    assert_eq!(result.instantiated_containers().len(), 1);
    assert!(result.diagnostics().iter().any(|d| matches!(
        d.kind,
        cxxbind_diag::BuildDiagKind::UnresolvedTemplateInstantiation { .. }
    )));
}

#[test]
fn snippet_markers_contribute_instantiations() {
    let mut user = ClassItem::named("User");
    user.functions.push(method("nop", "void", &[]));

    let result = ModelFixture::new()
        .entry(TypeEntry::container("List", ContainerKind::Sequence))
        .entry(TypeEntry::value("Foo"))
        .entry(
            TypeEntry::object("User")
                .with_snippet("auto x = %CONVERTTONATIVE[List<Foo>](obj);"),
        )
        .class(ClassItem::named("Foo"))
        .class(user)
        .build_ok();

    let containers = result.instantiated_containers();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].instantiations().len(), 1);
}
