use super::*;
use crate::compilation::CompilationOptions;
use crate::fixtures::*;
use serde_json::{Value, json};

fn class(name: &str, members: Value) -> Value {
    json!({"name": name, "kind": "class", "members": members, "location": loc(0)})
}

fn table(c: &Compilation, name: &str) -> Arc<MemberTable> {
    c.member_table_in(type_id(c, name), &mut ResolutionContext::uncancellable())
        .unwrap()
}

fn names(table: &MemberTable) -> Vec<&str> {
    table.members().iter().map(|m| m.name()).collect()
}

#[test]
fn members_keep_declaration_order_and_indexer_name() {
    let c = compile(json!([class("C", json!([
        field("x", "int", 10),
        method("M", "void", &[], 20),
        {
            "kind": "indexer", "ty": "int",
            "parameters": [{"name": "i", "ty": "int"}],
            "accessors": [{"kind": "get", "has_body": true, "location": loc(31)}],
            "annotations": [annotation("IndexerName", json!([{"value": {"str": "Cell"}}]), 29)],
            "location": loc(30)
        },
    ]))]));
    let table = table(&c, "C");
    assert_eq!(names(&table), vec!["x", "M", "Cell", ".ctor"]);
    assert!(table.has_indexer());
    assert_eq!(table.by_name("Cell").count(), 1);
    assert_eq!(table.by_name("Item").count(), 0);
    assert!(table.diagnostics().is_empty(), "{:?}", table.diagnostics());
    assert_eq!(
        table.members()[3].origin(),
        MemberOrigin::Synthesized("implicit-constructor")
    );
}

#[test]
fn partial_implementation_is_hidden_but_registered() {
    let c = compile(json!([class("C", json!([
        {
            "kind": "method", "name": "Run", "modifiers": ["partial"],
            "annotations": [annotation("Obsolete", json!([]), 9)],
            "location": loc(10)
        },
        {
            "kind": "method", "name": "Run", "modifiers": ["partial"], "has_body": true,
            "annotations": [annotation("Conditional", json!([{"value": {"str": "DEBUG"}}]), 19)],
            "location": loc(20)
        },
    ]))]));
    let id = type_id(&c, "C");
    let visible = c.get_members_by_name(id, "Run");
    assert_eq!(visible.len(), 1);
    let definition = &visible[0];
    assert_eq!(definition.applications().len(), 2);
    let link = definition.partial().unwrap();
    assert_eq!(link.role, PartialRole::Definition);

    let implementation = c.member_entity(link.partner.unwrap()).unwrap();
    assert!(implementation.is_hidden());
    assert!(implementation.applications().is_empty());
    assert_eq!(implementation.partial().unwrap().partner, Some(definition.id()));
    assert!(c.get_members(id).iter().all(|m| !m.is_hidden()));
}

#[test]
fn field_like_event_gets_a_backing_field() {
    let c = compile(json!([class("C", json!([
        {"kind": "event", "name": "Changed", "ty": "Handler", "modifiers": ["public"], "location": loc(10)},
        field("y", "int", 20),
    ])), {"name": "Handler", "kind": "class", "location": loc(100)}]));
    let table = table(&c, "C");
    let members = table.members();
    assert_eq!(members[0].name(), "Changed");
    assert_eq!(members[1].name(), "Changed");
    assert!(members[1].is_field());
    assert!(matches!(
        members[1].origin(),
        MemberOrigin::ImplicitBackingField { event_ordinal: 0 }
    ));
    assert_eq!(members[2].name(), "y");
    assert!(table.diagnostics().is_empty());
}

#[test]
fn conflicting_members_are_reported_on_the_later_one() {
    let c = compile(json!([class("C", json!([
        field("A", "int", 10),
        method("A", "void", &[], 20),
        method("B", "void", &[("x", "int")], 30),
        method("B", "void", &[("y", "int")], 40),
        method("D", "void", &[("x", "int")], 50),
        {
            "kind": "method", "name": "D", "ty": "void", "has_body": true,
            "parameters": [{"name": "x", "ty": "int", "ref_kind": "ref"}],
            "location": loc(60)
        },
        method("E", "void", &[("x", "int")], 70),
        method("E", "void", &[("x", "string")], 80),
    ]))]));
    let table = table(&c, "C");
    let reported: Vec<(u32, u32)> = table
        .diagnostics()
        .iter()
        .map(|d| (d.code, d.start))
        .collect();
    assert_eq!(
        reported,
        vec![
            (diagnostic_codes::DUPLICATE_MEMBER_NAME, 20),
            (diagnostic_codes::DUPLICATE_SIGNATURE, 40),
            (diagnostic_codes::OVERLOAD_DIFFERS_ONLY_BY_REF_KIND, 60),
        ]
    );
    assert!(table.diagnostics()[2].message_text.contains("by-value"));
}

#[test]
fn operators_require_their_partner() {
    let op = |token: &str, start: u32| {
        json!({
            "kind": {"operator": token}, "ty": "bool", "modifiers": ["public", "static"],
            "parameters": [{"name": "a", "ty": "C"}, {"name": "b", "ty": "C"}],
            "has_body": true, "location": loc(start)
        })
    };
    let c = compile(json!([class("C", json!([op("==", 10), op("<", 20), op(">", 30)]))]));
    let table = table(&c, "C");
    assert_eq!(
        codes(table.diagnostics()),
        vec![diagnostic_codes::OPERATOR_REQUIRES_MATCHING]
    );
    assert_eq!(table.diagnostics()[0].start, 10);
}

#[test]
fn accessor_names_are_reserved() {
    let c = compile(json!([class("C", json!([
        {
            "kind": "property", "name": "P", "ty": "int",
            "accessors": [{"kind": "get", "has_body": true, "location": loc(11)}],
            "location": loc(10)
        },
        method("get_P", "int", &[], 20),
        method("set_P", "void", &[("value", "int")], 30),
    ]))]));
    let table = table(&c, "C");
    assert_eq!(
        codes(table.diagnostics()),
        vec![diagnostic_codes::ACCESSOR_NAME_RESERVED]
    );
    assert_eq!(table.diagnostics()[0].start, 20);
}

#[test]
fn interfaces_reject_instance_fields() {
    let c = compile(json!([{
        "name": "I", "kind": "interface",
        "members": [field("f", "int", 10), method("M", "void", &[], 20)],
        "location": loc(0)
    }]));
    let table = table(&c, "I");
    assert_eq!(
        codes(table.diagnostics()),
        vec![diagnostic_codes::INTERFACE_CANNOT_CONTAIN_FIELDS]
    );
    assert_eq!(names(&table), vec!["f", "M"]);
}

#[test]
fn synthesis_can_be_disabled() {
    let c = compile_with(
        json!([class("C", json!([field("x", "int", 10)]))]),
        CompilationOptions {
            synthesize_members: false,
            ..CompilationOptions::default()
        },
    );
    assert_eq!(names(&table(&c, "C")), vec!["x"]);
}

#[test]
fn early_table_does_not_build_the_full_table() {
    let c = compile(json!([class("C", json!([
        field("x", "int", 10),
        {"kind": "field", "name": "K", "ty": "int", "modifiers": ["const"], "constant": {"int": 3}, "location": loc(15)},
        method("M", "void", &[], 20),
        {"kind": "event", "name": "E", "ty": "C", "location": loc(30)},
    ]))]));
    let id = type_id(&c, "C");
    let early = c.early_member_table(id).unwrap();
    let fields: Vec<&str> = early.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["x", "K", "E"]);
    assert!(early.field("K").unwrap().is_const);
    assert!(early.fields()[2].implicit);
    assert!(!c.type_entity(id).unwrap().members.is_published());
}

#[test]
fn concurrent_builders_publish_one_table() {
    let c = compile(json!([class("C", json!([
        field("a", "int", 10),
        method("M", "void", &[], 20),
        method("M", "void", &[("x", "int")], 30),
    ]))]));
    let id = type_id(&c, "C");
    let tables: Vec<Arc<MemberTable>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| c.member_table_in(id, &mut ResolutionContext::uncancellable()).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for table in &tables[1..] {
        assert!(Arc::ptr_eq(table, &tables[0]));
    }
    for member in tables[0].all() {
        let registered = c.member_entity(member.id()).unwrap();
        assert!(Arc::ptr_eq(&registered, member));
    }
}
