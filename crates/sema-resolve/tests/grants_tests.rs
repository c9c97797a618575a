use super::*;
use crate::annotations::{
    AnnotationRequest, AnnotationResolver, AnnotationTypeResolution, DefaultAnnotationResolver,
};
use crate::annotations::WellKnownAnnotation;
use crate::compilation::CompilationBuilder;
use crate::completion::{CompletionPart, PartState};
use crate::fixtures::*;
use crate::ids::EntityId;
use sema_common::CancellationToken;
use serde_json::{Value, json};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

fn grant(text: &str) -> InternalsGrant {
    InternalsGrant::parse(text).unwrap()
}

fn key_arg(key: &str) -> Value {
    json!([{"value": {"str": key}}])
}

/// Checks access to every reference while binding, and remembers what the
/// identity looked like at that point.
#[derive(Default)]
struct AccessCheckingResolver {
    answers: Mutex<Vec<(ReferenceId, bool)>>,
    seen_identities: Mutex<Vec<UnitIdentity>>,
}

impl AnnotationResolver for AccessCheckingResolver {
    fn resolve(
        &self,
        compilation: &Compilation,
        request: &AnnotationRequest<'_>,
        ctx: &mut ResolutionContext,
    ) -> AnnotationTypeResolution {
        for index in 0..compilation.references().len() {
            let reference = ReferenceId(index as u32);
            let answer = compilation.check_access(reference, ctx);
            self.answers.lock().unwrap().push((reference, answer));
        }
        let identity = compilation.identity_in(ctx).unwrap();
        self.seen_identities.lock().unwrap().push(identity.as_ref().clone());
        DefaultAnnotationResolver.resolve(compilation, request, ctx)
    }
}

fn with_access_checks(unit: Value) -> (Compilation, Arc<AccessCheckingResolver>) {
    let resolver = Arc::new(AccessCheckingResolver::default());
    let compilation = CompilationBuilder::new(source(unit))
        .resolver(Arc::clone(&resolver) as Arc<dyn AnnotationResolver>)
        .build();
    (compilation, resolver)
}

#[test]
fn grants_match_by_name_and_key() {
    let identity = UnitIdentity {
        name: "App".to_string(),
        version: None,
        public_key: Some("00ab".to_string()),
    };
    assert!(identity.satisfies(&grant("App")));
    assert!(identity.satisfies(&grant("App, PublicKey=00AB")));
    assert!(!identity.satisfies(&grant("App, PublicKey=00cd")));
    assert!(!identity.satisfies(&grant("Other")));
}

#[test]
fn identity_display() {
    let unsigned = UnitIdentity {
        name: "App".to_string(),
        version: None,
        public_key: None,
    };
    assert_eq!(unsigned.to_string(), "App, PublicKey=null");
}

#[test]
fn authoritative_checks_use_the_final_identity() {
    let c = compile_unit(json!({
        "name": "App",
        "references": [
            {"name": "Open", "internals_visible_to": ["App"]},
            {"name": "Keyed", "internals_visible_to": ["App, PublicKey=00cd"]},
            {"name": "Closed", "internals_visible_to": ["Other"]},
            {"name": "Silent"},
        ],
    }));
    assert!(c.are_internals_visible(ReferenceId(0)));
    assert!(!c.are_internals_visible(ReferenceId(1)));
    assert!(!c.are_internals_visible(ReferenceId(2)));
    assert!(!c.are_internals_visible(ReferenceId(3)));
    assert!(c.unit().ledger.optimistic_grants().is_empty());
}

#[test]
fn checks_during_identity_computation_are_optimistic() {
    let (c, resolver) = with_access_checks(json!({
        "name": "App",
        "annotations": [annotation("UnitKey", key_arg("00ab"), 1)],
        "references": [
            {"name": "Open", "internals_visible_to": ["App"]},
            {"name": "Strict", "internals_visible_to": ["App, PublicKey=00cd"]},
            {"name": "Closed", "internals_visible_to": ["Other"]},
        ],
    }));
    let identity = c.identity();
    assert_eq!(identity.public_key.as_deref(), Some("00ab"));

    let answers = resolver.answers.lock().unwrap().clone();
    assert_eq!(
        &answers[..3],
        &[
            (ReferenceId(0), true),
            (ReferenceId(1), true),
            (ReferenceId(2), false),
        ]
    );
    let seen = resolver.seen_identities.lock().unwrap().clone();
    assert_eq!(seen[0].public_key, None);

    let recorded: Vec<ReferenceId> = c
        .unit()
        .ledger
        .optimistic_grants()
        .iter()
        .map(|g| g.granting)
        .collect();
    assert_eq!(recorded, vec![ReferenceId(0), ReferenceId(1)]);

    let diagnostics = c.grant_diagnostics();
    assert_eq!(codes(&diagnostics), vec![diagnostic_codes::GRANT_KEY_MISMATCH]);
    assert!(diagnostics[0].message_text.contains("Strict"));
    assert!(!c.are_internals_visible(ReferenceId(1)));
}

#[test]
fn unsigned_unit_fails_keyed_grants_with_a_signing_diagnostic() {
    let (c, _resolver) = with_access_checks(json!({
        "name": "App",
        "annotations": [annotation("UnitVersion", key_arg("2.0"), 1)],
        "references": [
            {"name": "Strict", "internals_visible_to": ["App, PublicKey=00cd"]},
        ],
    }));
    let identity = c.identity();
    assert!(!identity.is_signed());
    assert_eq!(
        codes(&c.grant_diagnostics()),
        vec![diagnostic_codes::GRANT_SIGNING_MISMATCH]
    );
}

#[test]
fn reconciliation_reports_each_granting_unit_once() {
    let (c, _resolver) = with_access_checks(json!({
        "name": "App",
        "annotations": [
            annotation("UnitKey", key_arg("00ab"), 1),
            annotation("UnitVersion", key_arg("1.0"), 2),
        ],
        "references": [
            {"name": "Strict", "internals_visible_to": ["App, PublicKey=00cd", "App, PublicKey=00ef"]},
        ],
    }));
    c.identity();
    assert_eq!(c.grant_diagnostics().len(), 1);
}

#[test]
fn grant_diagnostics_are_empty_before_finalization() {
    let c = compile_unit(json!({"name": "App"}));
    assert!(c.grant_diagnostics().is_empty());
    c.identity();
    assert!(c.grant_diagnostics().is_empty());
}

#[test]
fn identity_is_finalized_once_across_threads() {
    let c = compile_unit(json!({
        "name": "App",
        "annotations": [annotation("UnitKey", key_arg("00ab"), 1)],
    }));
    let identities: Vec<Arc<UnitIdentity>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| c.identity())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for identity in &identities[1..] {
        assert!(Arc::ptr_eq(identity, &identities[0]));
    }
}

fn keyed_unit_with_strict_grant() -> Value {
    json!({
        "name": "App",
        "annotations": [annotation("UnitKey", key_arg("00ab"), 1)],
        "references": [
            {"name": "Strict", "internals_visible_to": ["App, PublicKey=00cd"]},
        ],
    })
}

fn other_thread_id() -> ThreadId {
    thread::spawn(|| thread::current().id()).join().unwrap()
}

#[test]
fn reconciliation_is_published_before_the_identity_is_final() {
    for _ in 0..200 {
        let (c, _resolver) = with_access_checks(keyed_unit_with_strict_grant());
        let barrier = Barrier::new(2);
        thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                c.identity();
            });
            scope.spawn(|| {
                barrier.wait();
                c.complete_all(&CancellationToken::none()).unwrap();
            });
        });
        let mismatches = c
            .diagnostics()
            .iter()
            .filter(|d| d.code == diagnostic_codes::GRANT_KEY_MISMATCH)
            .count();
        assert_eq!(mismatches, 1);
    }
}

#[test]
fn peeking_the_unit_key_does_not_strip_it_from_the_identity() {
    let (c, _resolver) = with_access_checks(keyed_unit_with_strict_grant());
    let peeked = c
        .peek_annotations(EntityId::UNIT, &[WellKnownAnnotation::UnitKey])
        .unwrap();
    assert_eq!(peeked.public_key.as_deref(), Some("00ab"));
    assert_eq!(c.identity().public_key.as_deref(), Some("00ab"));
    assert_eq!(
        codes(&c.grant_diagnostics()),
        vec![diagnostic_codes::GRANT_KEY_MISMATCH]
    );
}

#[test]
fn waiting_for_another_threads_identity_honours_cancellation() {
    let c = compile_unit(json!({
        "name": "App",
        "references": [{"name": "Open", "internals_visible_to": ["App"]}],
    }));
    *c.unit().ledger.state.lock().unwrap() = LedgerState::Computing(other_thread_id());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut ctx = ResolutionContext::new(cancel);
    assert_eq!(c.identity_in(&mut ctx).map(|_| ()), Err(Cancelled));

    assert!(c.check_access(ReferenceId(0), &mut ctx));
    assert!(c.unit().ledger.optimistic_grants().is_empty());
}

#[test]
fn cancelled_identity_part_is_released_for_a_later_request() {
    let c = compile_unit(json!({"name": "App"}));
    *c.unit().ledger.state.lock().unwrap() = LedgerState::Computing(other_thread_id());

    let cancel = CancellationToken::new();
    let outcome = thread::scope(|scope| {
        let worker = scope.spawn(|| c.complete_all(&cancel));
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        worker.join().unwrap()
    });
    assert_eq!(outcome, Err(Cancelled));
    assert_eq!(
        c.unit().core().state().state(CompletionPart::Identity),
        PartState::NotStarted
    );

    *c.unit().ledger.state.lock().unwrap() = LedgerState::Idle;
    assert!(c.complete_all(&CancellationToken::none()).is_ok());
    assert!(c.unit().core().state().is_done(CompletionPart::Identity));
}
