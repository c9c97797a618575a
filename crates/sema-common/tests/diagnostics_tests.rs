use super::*;
use crate::span::Location;
use rustc_hash::FxHashSet;

#[test]
fn format_message_replaces_positional_args() {
    assert_eq!(
        format_message("'{0}' and '{1}' and '{0}'", &["a", "b"]),
        "'a' and 'b' and 'a'"
    );
}

#[test]
fn codes_are_unique_in_table() {
    let mut seen = FxHashSet::default();
    for msg in DIAGNOSTIC_MESSAGES {
        assert!(seen.insert(msg.code), "duplicate code {}", msg.code);
    }
}

#[test]
fn from_code_uses_table_category_and_template() {
    let loc = Location::new("a.sm", 10, 15);
    let diag = Diagnostic::from_code(diagnostic_codes::FIELD_NEVER_USED, &loc, &["C.x"]);
    assert_eq!(diag.category, DiagnosticCategory::Warning);
    assert_eq!(diag.message_text, "The field 'C.x' is never used.");
    assert_eq!((diag.file.as_str(), diag.start, diag.length), ("a.sm", 10, 5));
}

#[test]
fn unknown_code_is_still_an_error() {
    let diag = Diagnostic::from_code(9999, &Location::default(), &[]);
    assert!(diag.is_error());
    assert!(get_diagnostic_message(9999).is_none());
}

#[test]
fn bag_add_returns_decoratable_diagnostic() {
    let mut bag = DiagnosticBag::new();
    let first = Location::new("a.sm", 0, 1);
    let second = Location::new("a.sm", 20, 1);
    let diag = bag.add(diagnostic_codes::DUPLICATE_MEMBER_NAME, &second, &["C", "x"]);
    *diag = diag.clone().with_related_location(&first, "first declared here");
    assert_eq!(bag.len(), 1);
    assert!(bag.has_errors());
    assert_eq!(bag.as_slice()[0].related_information.len(), 1);
    assert_eq!(bag.count_code(diagnostic_codes::DUPLICATE_MEMBER_NAME), 1);
}

#[test]
fn diagnostic_serializes_without_empty_related_information() {
    let diag = Diagnostic::from_code(
        diagnostic_codes::STRUCT_LAYOUT_CYCLE,
        &Location::new("s.sm", 3, 4),
        &["S.f", "S"],
    );
    let json = serde_json::to_value(&diag).unwrap();
    assert_eq!(json["code"], 1301);
    assert_eq!(json["category"], "Error");
    assert!(json.get("related_information").is_none());
}
