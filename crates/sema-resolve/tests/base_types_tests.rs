use super::*;
use crate::fixtures::*;
use serde_json::{Value, json};

fn decl(name: &str, kind: &str, start: u32, extra: Value) -> Value {
    let mut decl = json!({"name": name, "kind": kind, "location": loc(start)});
    if let (Some(decl), Some(extra)) = (decl.as_object_mut(), extra.as_object()) {
        decl.extend(extra.clone());
    }
    decl
}

fn base_outcome(c: &Compilation, name: &str) -> BaseTypeOutcome {
    let ty = c.type_entity(type_id(c, name)).unwrap();
    c.compute_base_type(&ty, &mut ResolutionContext::uncancellable())
}

fn interfaces_outcome(c: &Compilation, name: &str) -> InterfacesOutcome {
    let ty = c.type_entity(type_id(c, name)).unwrap();
    c.compute_interfaces(&ty, &mut ResolutionContext::uncancellable())
}

#[test]
fn class_base_is_resolved_and_published() {
    let c = compile(json!([
        decl("Animal", "class", 0, json!({})),
        decl("Dog", "class", 10, json!({"base": "Animal"})),
    ]));
    let animal = type_id(&c, "Animal");
    let dog = type_id(&c, "Dog");
    assert_eq!(
        c.base_type(dog),
        Some(ResolvedType::Source {
            id: animal,
            args: Vec::new(),
        })
    );
    assert_eq!(c.base_type(animal), None);
    assert!(c.type_entity(dog).unwrap().base.is_published());
}

#[test]
fn sealed_and_non_class_bases_are_rejected() {
    let c = compile(json!([
        decl("Final", "class", 0, json!({"modifiers": ["sealed"]})),
        decl("I", "interface", 5, json!({})),
        decl("A", "class", 10, json!({"base": "Final"})),
        decl("B", "class", 20, json!({"base": "I"})),
        decl("D", "class", 30, json!({"base": "string"})),
        decl("E", "class", 40, json!({"base": "object"})),
    ]));
    assert_eq!(codes(&base_outcome(&c, "A").diagnostics), vec![diagnostic_codes::BASE_CLASS_SEALED]);
    assert_eq!(codes(&base_outcome(&c, "B").diagnostics), vec![diagnostic_codes::BASE_NOT_CLASS]);
    assert_eq!(codes(&base_outcome(&c, "D").diagnostics), vec![diagnostic_codes::BASE_CLASS_SEALED]);
    let object = base_outcome(&c, "E");
    assert!(object.diagnostics.is_empty());
    assert_eq!(object.base, Some(ResolvedType::Primitive(PrimitiveKind::Object)));
    assert_eq!(c.base_type(type_id(&c, "A")), None);
}

#[test]
fn structs_and_interfaces_cannot_have_a_base() {
    let c = compile(json!([
        decl("Root", "class", 0, json!({})),
        decl("S", "struct", 10, json!({"base": "Root"})),
        decl("I", "interface", 20, json!({"base": "Root"})),
    ]));
    let s = base_outcome(&c, "S");
    assert_eq!(codes(&s.diagnostics), vec![diagnostic_codes::BASE_NOT_ALLOWED]);
    assert!(s.diagnostics[0].message_text.contains("struct"));
    assert_eq!(codes(&base_outcome(&c, "I").diagnostics), vec![diagnostic_codes::BASE_NOT_ALLOWED]);
}

#[test]
fn enum_underlying_type_is_not_a_base_class() {
    let c = compile(json!([
        decl("Small", "enum", 0, json!({"base": "byte"})),
        decl("Bad", "enum", 10, json!({"base": "string"})),
    ]));
    let small = base_outcome(&c, "Small");
    assert!(small.diagnostics.is_empty());
    assert_eq!(small.base, None);
    assert_eq!(codes(&base_outcome(&c, "Bad").diagnostics), vec![diagnostic_codes::BASE_NOT_ALLOWED]);
}

#[test]
fn circular_chain_is_reported_by_every_member() {
    let c = compile(json!([
        decl("A", "class", 0, json!({"base": "B"})),
        decl("B", "class", 10, json!({"base": "C"})),
        decl("C", "class", 20, json!({"base": "A"})),
        decl("Leaf", "class", 30, json!({"base": "A"})),
    ]));
    for name in ["A", "B", "C"] {
        let outcome = base_outcome(&c, name);
        assert_eq!(codes(&outcome.diagnostics), vec![diagnostic_codes::CIRCULAR_BASE], "{name}");
        assert_eq!(outcome.base, None);
    }
    let leaf = base_outcome(&c, "Leaf");
    assert!(leaf.diagnostics.is_empty());
    assert!(leaf.base.is_some());
}

#[test]
fn unknown_base_is_reported_once() {
    let c = compile(json!([decl("C", "class", 0, json!({"base": "Nope"}))]));
    let outcome = base_outcome(&c, "C");
    assert_eq!(codes(&outcome.diagnostics), vec![diagnostic_codes::TYPE_NOT_FOUND]);
    assert_eq!(outcome.base, None);
}

#[test]
fn partial_fragments_must_agree() {
    let c = compile(json!([
        decl("Root", "class", 0, json!({})),
        decl("Other", "class", 5, json!({})),
        decl("P", "class", 10, json!({"modifiers": ["partial"], "base": "Root"})),
        decl("P", "class", 20, json!({"modifiers": ["partial"], "base": "Other"})),
        decl("P", "struct", 30, json!({"modifiers": ["partial"]})),
        decl("P", "class", 40, json!({})),
    ]));
    let outcome = base_outcome(&c, "P");
    let reported: Vec<(u32, u32)> = outcome
        .diagnostics
        .iter()
        .map(|d| (d.code, d.start))
        .collect();
    assert_eq!(
        reported,
        vec![
            (diagnostic_codes::PARTIAL_KIND_MISMATCH, 30),
            (diagnostic_codes::MISSING_PARTIAL_MODIFIER, 40),
            (diagnostic_codes::PARTIAL_BASE_MISMATCH, 20),
        ]
    );
    assert_eq!(
        outcome.base,
        Some(ResolvedType::Source {
            id: type_id(&c, "Root"),
            args: Vec::new(),
        })
    );
}

#[test]
fn non_partial_duplicates_are_duplicate_types() {
    let c = compile(json!([
        decl("Twin", "class", 0, json!({"namespace": "App.Core"})),
        decl("Twin", "class", 10, json!({"namespace": "App.Core"})),
    ]));
    let outcome = base_outcome(&c, "App.Core.Twin");
    assert_eq!(codes(&outcome.diagnostics), vec![diagnostic_codes::DUPLICATE_TYPE]);
    assert!(outcome.diagnostics[0].message_text.contains("App.Core"));
}

#[test]
fn interface_list_is_checked_and_merged_across_fragments() {
    let c = compile(json!([
        decl("IA", "interface", 0, json!({})),
        decl("IB", "interface", 5, json!({})),
        decl("NotAnInterface", "class", 8, json!({})),
        decl("P", "class", 10, json!({"modifiers": ["partial"], "interfaces": ["IA", "IA", "NotAnInterface"]})),
        decl("P", "class", 20, json!({"modifiers": ["partial"], "interfaces": ["IA", "IB"]})),
    ]));
    let outcome = interfaces_outcome(&c, "P");
    assert_eq!(
        codes(&outcome.diagnostics),
        vec![
            diagnostic_codes::DUPLICATE_INTERFACE,
            diagnostic_codes::INTERFACE_EXPECTED,
        ]
    );
    let ia = type_id(&c, "IA");
    let ib = type_id(&c, "IB");
    assert_eq!(
        outcome.interfaces,
        vec![
            ResolvedType::Source { id: ia, args: Vec::new() },
            ResolvedType::Source { id: ib, args: Vec::new() },
        ]
    );
    assert_eq!(c.interfaces(type_id(&c, "P")), outcome.interfaces);
}

#[test]
fn enums_have_no_interfaces() {
    let c = compile(json!([
        decl("IA", "interface", 0, json!({})),
        decl("E", "enum", 10, json!({"interfaces": ["IA"]})),
    ]));
    let outcome = interfaces_outcome(&c, "E");
    assert!(outcome.interfaces.is_empty());
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn integral_underlying_types() {
    assert!(is_integral_ref(&TypeRef::Primitive(PrimitiveKind::Long)));
    assert!(!is_integral_ref(&TypeRef::Primitive(PrimitiveKind::Char)));
    assert!(!is_integral_ref(&TypeRef::Primitive(PrimitiveKind::Double)));
}
