use super::*;
use crate::fixtures::*;
use crate::completion::{CompletionPart, CompletionScope};
use crate::ids::ReferenceId;
use crate::reentrancy::ReentrancyProfile;
use sema_common::CancellationToken;
use serde_json::{Value, json};

fn str_arg(text: &str) -> Value {
    json!({"value": {"str": text}})
}

#[test]
fn obsolete_is_decoded_into_the_sealed_bag() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [annotation("Obsolete", json!([str_arg("use D"), {"value": {"bool": true}}]), 1)],
        "location": loc(0)
    }]));
    let bag = c.get_annotation_data(type_id(&c, "C")).unwrap();
    assert_eq!(
        bag.early().obsolete,
        Some(ObsoleteData {
            message: Some("use D".to_string()),
            is_error: true,
        })
    );
    assert!(bag.has(WellKnownAnnotation::Obsolete));
    assert!(bag.diagnostics().is_empty());
}

#[test]
fn unknown_annotation_is_reported_and_omitted() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [annotation("Missing", json!([]), 1)],
        "location": loc(0)
    }]));
    let id = type_id(&c, "C");
    let bag = c.get_annotation_data(id).unwrap();
    assert_eq!(codes(bag.diagnostics()), vec![diagnostic_codes::ANNOTATION_NOT_FOUND]);
    assert!(c.is_annotation_omitted(id, 0));
}

#[test]
fn annotation_on_wrong_target_is_omitted() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [annotation("IndexerName", json!([str_arg("Item")]), 1)],
        "location": loc(0)
    }]));
    let bag = c.get_annotation_data(type_id(&c, "C")).unwrap();
    assert_eq!(codes(bag.diagnostics()), vec![diagnostic_codes::ANNOTATION_INVALID_TARGET]);
    assert!(bag.diagnostics()[0].message_text.contains("Indexer"));
    assert!(bag.is_omitted(0));
    assert!(!bag.has(WellKnownAnnotation::IndexerName));
}

#[test]
fn second_single_use_application_is_a_duplicate() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [
            annotation("Obsolete", json!([str_arg("first")]), 1),
            annotation("ObsoleteAttribute", json!([str_arg("second")]), 2),
        ],
        "location": loc(0)
    }]));
    let bag = c.get_annotation_data(type_id(&c, "C")).unwrap();
    assert_eq!(codes(bag.diagnostics()), vec![diagnostic_codes::DUPLICATE_ANNOTATION]);
    assert!(!bag.is_omitted(0));
    assert!(bag.is_omitted(1));
    assert_eq!(
        bag.early().obsolete.as_ref().and_then(|o| o.message.as_deref()),
        Some("first")
    );
}

#[test]
fn conditional_may_repeat_on_methods() {
    let mut m = method("Log", "void", &[], 10);
    m["annotations"] = json!([
        annotation("Conditional", json!([str_arg("DEBUG")]), 11),
        annotation("Conditional", json!([str_arg("TRACE")]), 12),
    ]);
    let c = compile(json!([{"name": "C", "kind": "class", "members": [m], "location": loc(0)}]));
    let members = c.get_members_by_name(type_id(&c, "C"), "Log");
    let bag = c.get_annotation_data(members[0].id()).unwrap();
    assert!(bag.diagnostics().is_empty());
    assert_eq!(bag.early().conditional_symbols, vec!["DEBUG", "TRACE"]);
}

#[test]
fn peeking_does_not_seal_the_bag() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [
            annotation("Obsolete", json!([]), 1),
            annotation("DefaultMember", json!([str_arg("Run")]), 2),
        ],
        "location": loc(0)
    }]));
    let id = type_id(&c, "C");
    let peeked = c
        .peek_annotations(id, &[WellKnownAnnotation::Obsolete])
        .unwrap();
    assert!(peeked.obsolete.is_some());
    let ty = c.type_entity(id).unwrap();
    assert!(!ty.core().bag.is_published());
    assert!(!ty.core().state().is_done(CompletionPart::Annotations));

    c.force_complete(id, &CompletionScope::all(), &CancellationToken::none())
        .unwrap();
    assert!(ty.core().state().is_done(CompletionPart::Annotations));
    let bag = c.get_annotation_data(id).unwrap();
    assert!(ty.core().bag.is_published());
    assert_eq!(bag.early().obsolete, peeked.obsolete);
    assert_eq!(bag.full().default_member.as_ref().map(|(n, _)| n.as_str()), Some("Run"));
}

#[test]
fn peeking_the_unit_leaves_its_annotations_phase_open() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [
            annotation("UnitVersion", json!([str_arg("1.2")]), 1),
            annotation("UnitKey", json!([str_arg("00AB")]), 2),
        ],
    }));
    let peeked = c
        .peek_annotations(EntityId::UNIT, &[WellKnownAnnotation::UnitKey])
        .unwrap();
    assert_eq!(peeked.public_key.as_deref(), Some("00ab"));
    assert_eq!(peeked.version, None);

    let unit = c.unit();
    assert!(!unit.core().bag.is_published());
    assert!(!unit.core().state().is_done(CompletionPart::Annotations));
    assert_eq!(c.identity().public_key.as_deref(), Some("00ab"));

    c.complete_all(&CancellationToken::none()).unwrap();
    assert!(unit.core().state().is_done(CompletionPart::Annotations));
    assert_eq!(
        c.get_annotation_data(EntityId::UNIT).unwrap().early().public_key,
        peeked.public_key
    );
}

fn class_entity(c: &Compilation, name: &str) -> EntityRef {
    EntityRef::Type(c.type_entity(type_id(c, name)).unwrap())
}

#[test]
fn iteration_budget_starts_over_for_each_application() {
    let annotations: Vec<Value> = (0..30).map(|i| annotation("Missing", json!([]), i + 1)).collect();
    let c = compile(json!([{"name": "C", "kind": "class", "annotations": annotations, "location": loc(0)}]));
    let mut ctx = ResolutionContext::with_profile(
        CancellationToken::none(),
        ReentrancyProfile::Custom {
            max_depth: 16,
            max_iterations: 16,
        },
    );
    let bag = c.annotation_bag(&class_entity(&c, "C"), &mut ctx);
    assert_eq!(
        codes(bag.diagnostics()),
        vec![diagnostic_codes::ANNOTATION_NOT_FOUND; 30]
    );
}

#[test]
fn exceeding_the_resolution_limit_is_reported() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [annotation("Obsolete", json!([]), 1)],
        "location": loc(0)
    }]));
    let mut ctx = ResolutionContext::with_profile(
        CancellationToken::none(),
        ReentrancyProfile::Custom {
            max_depth: 0,
            max_iterations: 100,
        },
    );
    let bag = c.annotation_bag(&class_entity(&c, "C"), &mut ctx);
    assert_eq!(
        codes(bag.diagnostics()),
        vec![diagnostic_codes::RESOLUTION_LIMIT_EXCEEDED]
    );
    assert!(bag.diagnostics()[0].message_text.contains("Obsolete"));
    assert!(bag.is_omitted(0));
}

#[test]
fn unit_identity_comes_from_version_and_key() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [
            annotation("UnitVersion", json!([str_arg("1.2.3")]), 1),
            annotation("UnitKey", json!([str_arg("00AB")]), 2),
        ],
    }));
    let identity = c.identity();
    assert_eq!(identity.version.map(|v| v.to_string()).as_deref(), Some("1.2.3.0"));
    assert_eq!(identity.public_key.as_deref(), Some("00ab"));
    assert!(identity.is_signed());
}

#[test]
fn signed_unit_grants_require_a_key() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [
            annotation("UnitKey", json!([str_arg("00ab")]), 1),
            annotation("InternalsVisibleTo", json!([str_arg("Friend")]), 2),
            annotation("InternalsVisibleTo", json!([str_arg("Other, PublicKey=00cd")]), 3),
        ],
    }));
    let bag = c.get_annotation_data(EntityId::UNIT).unwrap();
    assert_eq!(codes(bag.diagnostics()), vec![diagnostic_codes::GRANT_MISSING_KEY]);
    assert_eq!(bag.full().grants.len(), 2);
}

#[test]
fn source_annotation_class_declares_its_usage() {
    let c = compile(json!([
        {
            "name": "OnlyMethods", "kind": "class",
            "annotations": [annotation("AnnotationUsage", json!([str_arg("Method")]), 1)],
            "location": loc(0)
        },
        {"name": "Tag", "kind": "class", "location": loc(10)},
        {
            "name": "C", "kind": "class",
            "annotations": [annotation("OnlyMethods", json!([]), 21), annotation("Tag", json!([]), 22)],
            "location": loc(20)
        },
    ]));
    let tag = type_id(&c, "Tag");
    let bag = c.get_annotation_data(type_id(&c, "C")).unwrap();
    assert_eq!(codes(bag.diagnostics()), vec![diagnostic_codes::ANNOTATION_INVALID_TARGET]);
    assert_eq!(bag.full().user.len(), 1);
    assert_eq!(bag.full().user[0].ty, UserAnnotationType::Source(tag));
}

#[test]
fn arguments_may_name_constant_fields() {
    let c = compile(json!([{
        "name": "C", "kind": "class",
        "annotations": [annotation("Obsolete", json!([{"value": {"const": "Reason"}}]), 1)],
        "members": [{
            "kind": "field", "name": "Reason", "ty": "string", "modifiers": ["const"],
            "constant": {"str": "gone"}, "location": loc(10)
        }],
        "location": loc(0)
    }]));
    let bag = c.get_annotation_data(type_id(&c, "C")).unwrap();
    assert_eq!(
        bag.early().obsolete.as_ref().and_then(|o| o.message.as_deref()),
        Some("gone")
    );
}

#[test]
fn forwarders_follow_into_the_target_unit() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [annotation("TypeForwardedTo", json!([{"value": {"type": "Lib.Moved"}}]), 1)],
        "references": [
            {"name": "Lib", "forwarders": [{"name": "Lib.Moved", "target": "Core"}]},
            {"name": "Core", "types": [{"name": "Lib.Moved", "kind": "class"}]},
        ],
    }));
    let bag = c.get_annotation_data(EntityId::UNIT).unwrap();
    assert!(bag.diagnostics().is_empty(), "{:?}", bag.diagnostics());
    let forwarded = &bag.full().forwarded_types;
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].target, ReferenceId(1));
}

#[test]
fn forwarder_cycle_is_reported_once() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [annotation("TypeForwardedTo", json!([{"value": {"type": "X"}}]), 1)],
        "references": [
            {"name": "Lib", "forwarders": [{"name": "X", "target": "Core"}]},
            {"name": "Core", "forwarders": [{"name": "X", "target": "Lib"}]},
        ],
    }));
    let bag = c.get_annotation_data(EntityId::UNIT).unwrap();
    assert_eq!(codes(bag.diagnostics()), vec![diagnostic_codes::FORWARDER_CYCLE]);
    assert!(bag.full().forwarded_types.is_empty());
}

#[test]
fn forwarding_a_source_type_conflicts() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [annotation("TypeForwardedTo", json!([{"value": {"type": "C"}}]), 1)],
        "types": [{"name": "C", "kind": "class", "location": loc(10)}],
    }));
    let bag = c.get_annotation_data(EntityId::UNIT).unwrap();
    assert_eq!(
        codes(bag.diagnostics()),
        vec![diagnostic_codes::FORWARDER_CONFLICTS_WITH_SOURCE]
    );
}
