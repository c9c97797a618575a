use super::*;
use crate::annotations::{AnnotationRequest, AnnotationTypeResolution};
use crate::fixtures::*;
use sema_common::Location;
use serde_json::{Value, json};
use std::sync::Mutex;

fn class(name: &str, start: u32, members: Value) -> Value {
    json!({"name": name, "kind": "class", "members": members, "location": loc(start)})
}

fn const_field(name: &str, value: Value, start: u32) -> Value {
    json!({
        "kind": "field", "name": name, "ty": "int", "modifiers": ["const"],
        "constant": value, "location": loc(start)
    })
}

fn member_id(c: &Compilation, ty: &str, name: &str) -> EntityId {
    c.get_members_by_name(type_id(c, ty), name)[0].id()
}

fn complete(c: &Compilation) -> CompletionOutcome {
    c.complete_all(&CancellationToken::none()).unwrap()
}

/// Counts how often each part of each entity reported.
#[derive(Default)]
struct CountingSink {
    reports: Mutex<FxHashMap<(EntityId, CompletionPart), usize>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink for CountingSink {
    fn report(&self, entity: EntityId, part: CompletionPart, diagnostics: &[Diagnostic]) {
        *self.reports.lock().unwrap().entry((entity, part)).or_default() += 1;
        self.diagnostics.lock().unwrap().extend_from_slice(diagnostics);
    }
}

fn busy_unit() -> Value {
    json!({
        "name": "App",
        "annotations": [annotation("Missing", json!([]), 1)],
        "types": [
            class("A", 10, json!([
                field("x", "int", 20),
                method("M", "void", &[("p", "Nope")], 30),
                method("M", "void", &[("q", "Nope")], 40),
            ])),
            {"name": "S", "kind": "struct", "members": [field("s", "S", 60)], "location": loc(50)},
            {"name": "D", "kind": "class", "base": "S", "location": loc(70),
             "nested_types": [class("Inner", 80, json!([field("y", "Unknown", 90)]))]},
        ],
    })
}

#[test]
fn complete_all_reaches_every_entity() {
    let c = compile_unit(busy_unit());
    assert_eq!(complete(&c), CompletionOutcome::Complete);
    assert!(c.unit().core().state().is_complete());
    for ty in c.types() {
        assert!(ty.core().state().is_complete(), "{}", ty.full_name());
        for member in c.get_members(ty.id()) {
            assert!(member.core().state().is_complete(), "{}", member.name());
        }
    }
    let inner = type_id(&c, "D.Inner");
    assert_eq!(c.get_nested_types(type_id(&c, "D")), vec![inner]);
}

#[test]
fn concurrent_completion_executes_each_part_once() {
    let sink = Arc::new(CountingSink::default());
    let c = CompilationBuilder::new(source(busy_unit()))
        .sink(Arc::clone(&sink) as Arc<dyn DiagnosticSink>)
        .build();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| assert_eq!(complete(&c), CompletionOutcome::Complete));
        }
    });
    let reports = sink.reports.lock().unwrap();
    assert!(!reports.is_empty());
    assert!(reports.values().all(|&count| count == 1), "{reports:?}");
    assert_eq!(sink.diagnostics.lock().unwrap().len(), c.diagnostics().len());
}

#[test]
fn diagnostics_are_reported_exactly_once() {
    let sequential = compile_unit(busy_unit());
    complete(&sequential);
    complete(&sequential);
    let expected = sequential.diagnostics();

    let concurrent = compile_unit(busy_unit());
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| complete(&concurrent));
        }
    });
    assert_eq!(concurrent.diagnostics(), expected);
    assert_eq!(
        codes(&expected),
        vec![
            diagnostic_codes::ANNOTATION_NOT_FOUND,
            diagnostic_codes::TYPE_NOT_FOUND,
            diagnostic_codes::TYPE_NOT_FOUND,
            diagnostic_codes::DUPLICATE_SIGNATURE,
            diagnostic_codes::STRUCT_LAYOUT_CYCLE,
            diagnostic_codes::BASE_NOT_CLASS,
            diagnostic_codes::TYPE_NOT_FOUND,
        ]
    );
}

#[test]
fn scoped_completion_is_partial_until_everything_is_done() {
    let c = compile(json!([
        {"name": "IA", "kind": "interface", "members": [method("M", "void", &[], 10)], "location": loc(0)},
        {"name": "IB", "kind": "interface", "members": [method("N", "void", &[], 110)], "location": loc(100)},
    ]));
    let ia = type_id(&c, "IA");
    let ib = type_id(&c, "IB");
    let scope = CompletionScope::at(Location::new("a.sm", 0, 50));
    let outcome = c
        .force_complete(EntityId::UNIT, &scope, &CancellationToken::none())
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Partial);
    assert!(c.type_entity(ia).unwrap().core().state().is_complete());
    assert!(!c.type_entity(ib).unwrap().core().state().is_complete());
    assert!(!c.unit().core().state().is_done(CompletionPart::Members));

    let filtered = CompletionScope::all().with_filter(move |id| id != ib);
    let outcome = c
        .force_complete(EntityId::UNIT, &filtered, &CancellationToken::none())
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Partial);

    assert_eq!(complete(&c), CompletionOutcome::Complete);
    assert!(c.type_entity(ib).unwrap().core().state().is_complete());
}

#[test]
fn unknown_entities_are_partial() {
    let c = compile(json!([]));
    let outcome = c
        .force_complete(EntityId(9999), &CompletionScope::all(), &CancellationToken::none())
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::Partial);
}

#[test]
fn cancelled_requests_stop() {
    let c = compile_unit(busy_unit());
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(c.complete_all(&cancel).is_err());
    assert!(!c.unit().core().state().is_complete());
    assert_eq!(complete(&c), CompletionOutcome::Complete);
}

/// Completes the entity whose annotations it is binding.
#[derive(Default)]
struct ReentrantResolver {
    target: Mutex<Option<EntityId>>,
    outcomes: Mutex<Vec<CompletionOutcome>>,
}

impl AnnotationResolver for ReentrantResolver {
    fn resolve(
        &self,
        compilation: &Compilation,
        request: &AnnotationRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> AnnotationTypeResolution {
        let target = *self.target.lock().unwrap();
        if let (Some(target), "Reenter") = (target, request.application.name.as_str()) {
            if let Ok(outcome) = compilation.force_complete_in(target, &CompletionScope::all(), ctx) {
                self.outcomes.lock().unwrap().push(outcome);
            }
        }
        DefaultAnnotationResolver.resolve(compilation, request, ctx)
    }
}

#[test]
fn reentrant_completion_returns_partial() {
    let resolver = Arc::new(ReentrantResolver::default());
    let unit = source(json!({"name": "App", "types": [{
        "name": "C", "kind": "class",
        "annotations": [annotation("Reenter", json!([]), 1)],
        "location": loc(0)
    }]}));
    let c = CompilationBuilder::new(unit)
        .resolver(Arc::clone(&resolver) as Arc<dyn AnnotationResolver>)
        .build();
    *resolver.target.lock().unwrap() = Some(type_id(&c, "C"));

    assert_eq!(complete(&c), CompletionOutcome::Complete);
    assert_eq!(
        resolver.outcomes.lock().unwrap().first(),
        Some(&CompletionOutcome::Partial)
    );
    assert_eq!(codes(&c.diagnostics()), vec![diagnostic_codes::ANNOTATION_NOT_FOUND]);
}

#[test]
fn struct_cycles_through_completion() {
    let c = compile(json!([
        {"name": "G", "kind": "struct", "type_params": ["T"], "members": [field("value", "T", 10)], "location": loc(0)},
        {"name": "H", "kind": "struct", "members": [field("g", "G<string>", 30)], "location": loc(20)},
        {"name": "Loop", "kind": "struct", "members": [field("self_", "Loop", 50)], "location": loc(40)},
    ]));
    complete(&c);
    assert!(!c.has_struct_cycle(type_id(&c, "G")));
    assert!(!c.has_struct_cycle(type_id(&c, "H")));
    assert!(c.has_struct_cycle(type_id(&c, "Loop")));
    let cycles: Vec<u32> = c
        .diagnostics()
        .iter()
        .filter(|d| d.code == diagnostic_codes::STRUCT_LAYOUT_CYCLE)
        .map(|d| d.start)
        .collect();
    assert_eq!(cycles, vec![50]);
}

/// Asks every reference for access while the identity is being computed.
struct AccessChecker;

impl AnnotationResolver for AccessChecker {
    fn resolve(
        &self,
        compilation: &Compilation,
        request: &AnnotationRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> AnnotationTypeResolution {
        for index in 0..compilation.references().len() {
            compilation.check_access(ReferenceId(index as u32), ctx);
        }
        DefaultAnnotationResolver.resolve(compilation, request, ctx)
    }
}

#[test]
fn optimistic_grants_are_reconciled_during_completion() {
    let unit = source(json!({
        "name": "App",
        "annotations": [annotation("UnitKey", json!([{"value": {"str": "00ab"}}]), 1)],
        "references": [
            {"name": "Strict", "internals_visible_to": ["App, PublicKey=00cd"]},
            {"name": "Open", "internals_visible_to": ["App"]},
        ],
    }));
    let c = CompilationBuilder::new(unit)
        .resolver(Arc::new(AccessChecker))
        .build();
    assert_eq!(complete(&c), CompletionOutcome::Complete);
    let diagnostics = c.diagnostics();
    assert_eq!(codes(&diagnostics), vec![diagnostic_codes::GRANT_KEY_MISMATCH]);
    assert!(diagnostics[0].message_text.contains("Strict"));
    assert!(c.are_internals_visible(ReferenceId(1)));
    assert!(!c.are_internals_visible(ReferenceId(0)));
}

#[test]
fn constants_follow_references_and_detect_cycles() {
    let c = compile(json!([
        class("C", 0, json!([
            const_field("A", json!({"const": "B"}), 10),
            const_field("B", json!({"const": "A"}), 20),
            const_field("Text", json!({"str": "x"}), 30),
            const_field("Alias", json!({"const": "Text"}), 40),
            const_field("Remote", json!({"const": "Other.K"}), 50),
            const_field("Lost", json!({"const": "Nowhere"}), 60),
            const_field("Tainted", json!({"const": "A"}), 70),
        ])),
        class("Other", 100, json!([const_field("K", json!({"int": 7}), 110)])),
    ]));
    assert_eq!(
        c.constant_value(member_id(&c, "C", "Alias")),
        Some(ArgValue::Str("x".to_string()))
    );
    assert_eq!(c.constant_value(member_id(&c, "C", "Remote")), Some(ArgValue::Int(7)));
    assert_eq!(c.constant_value(member_id(&c, "C", "A")), None);
    assert_eq!(c.constant_value(member_id(&c, "C", "Tainted")), None);

    complete(&c);
    let reported: Vec<(u32, u32)> = c
        .diagnostics()
        .iter()
        .map(|d| (d.code, d.start))
        .collect();
    assert_eq!(
        reported,
        vec![
            (diagnostic_codes::CONSTANT_CYCLE, 10),
            (diagnostic_codes::CONSTANT_CYCLE, 20),
            (diagnostic_codes::CONSTANT_NOT_FOUND, 60),
        ]
    );
}

#[test]
fn conditional_methods_must_return_void() {
    let mut value_method = method("Compute", "int", &[], 10);
    value_method["annotations"] = json!([annotation("Conditional", json!([{"value": {"str": "DEBUG"}}]), 9)]);
    let mut void_method = method("Log", "void", &[], 20);
    void_method["annotations"] = json!([annotation("Conditional", json!([{"value": {"str": "DEBUG"}}]), 19)]);
    let c = compile(json!([class("C", 0, json!([value_method, void_method]))]));
    complete(&c);
    let reported: Vec<(u32, u32)> = c
        .diagnostics()
        .iter()
        .map(|d| (d.code, d.start))
        .collect();
    assert_eq!(reported, vec![(diagnostic_codes::CONDITIONAL_REQUIRES_VOID, 10)]);
}

#[test]
fn default_member_conflicts_with_an_indexer() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [annotation("DefaultMember", json!([{"value": {"str": "Item"}}]), 1)],
        "members": [{
            "kind": "indexer", "ty": "int", "parameters": [{"name": "i", "ty": "int"}],
            "accessors": [{"kind": "get", "has_body": true, "location": loc(11)}],
            "location": loc(10)
        }],
        "location": loc(0)
    }]));
    complete(&c);
    let reported: Vec<(u32, u32)> = c
        .diagnostics()
        .iter()
        .map(|d| (d.code, d.start))
        .collect();
    assert_eq!(reported, vec![(diagnostic_codes::DEFAULT_MEMBER_WITH_INDEXER, 1)]);
}

fn partial_pair() -> Value {
    json!([class("C", 0, json!([
        {
            "kind": "method", "name": "Run", "modifiers": ["partial"],
            "parameters": [{"name": "a", "ty": "int"}], "location": loc(10)
        },
        {
            "kind": "method", "name": "Run", "modifiers": ["partial"], "has_body": true,
            "parameters": [{"name": "b", "ty": "int"}], "location": loc(20)
        },
    ]))])
}

#[test]
fn warnings_can_be_promoted_to_errors() {
    let c = compile(partial_pair());
    complete(&c);
    let diagnostics = c.diagnostics();
    assert_eq!(codes(&diagnostics), vec![diagnostic_codes::PARTIAL_PARAMETER_NAME_DIFFERS]);
    assert_eq!(diagnostics[0].category, DiagnosticCategory::Warning);

    let strict = compile_with(
        partial_pair(),
        CompilationOptions {
            warnings_as_errors: true,
            ..CompilationOptions::default()
        },
    );
    complete(&strict);
    assert_eq!(strict.diagnostics()[0].category, DiagnosticCategory::Error);
}

#[test]
fn signatures_are_published_by_member_checks() {
    let c = compile(json!([
        class("C", 0, json!([method("Make", "Widget", &[("n", "int[]")], 10)])),
        class("Widget", 50, json!([])),
    ]));
    let id = member_id(&c, "C", "Make");
    let signature = c.member_signature(id).unwrap();
    assert_eq!(
        signature.ty,
        ResolvedType::Source {
            id: type_id(&c, "Widget"),
            args: Vec::new(),
        }
    );
    assert_eq!(
        signature.parameters,
        vec![(
            sema_model::RefKind::Value,
            ResolvedType::Array(Box::new(ResolvedType::Primitive(PrimitiveKind::Int)))
        )]
    );
}

#[test]
fn entity_lookup_covers_every_kind() {
    let c = compile(json!([class("C", 0, json!([field("f", "int", 10)]))]));
    let ty = type_id(&c, "C");
    let field = member_id(&c, "C", "f");
    assert!(matches!(c.entity(EntityId::UNIT), Some(EntityRef::Unit(_))));
    assert!(matches!(c.entity(ty), Some(EntityRef::Type(_))));
    assert!(matches!(c.entity(field), Some(EntityRef::Member(_))));
    assert!(c.entity(EntityId(9999)).is_none());
    assert_eq!(c.top_level_types(), &[ty]);
    assert_eq!(c.find_type("C", 1), None);
}
