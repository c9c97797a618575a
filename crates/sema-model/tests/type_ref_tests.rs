use super::*;

#[test]
fn parses_primitives_and_names() {
    assert_eq!(TypeRef::parse("int").unwrap(), TypeRef::Primitive(PrimitiveKind::Int));
    assert_eq!(TypeRef::parse(" Ns.Point ").unwrap(), TypeRef::named("Ns.Point"));
}

#[test]
fn parses_nested_generics_and_arrays() {
    let ty = TypeRef::parse("G<List<int>, string[]>[]").unwrap();
    let expected = TypeRef::Array(Box::new(TypeRef::generic(
        "G",
        vec![
            TypeRef::generic("List", vec![TypeRef::Primitive(PrimitiveKind::Int)]),
            TypeRef::Array(Box::new(TypeRef::Primitive(PrimitiveKind::String))),
        ],
    )));
    assert_eq!(ty, expected);
    assert_eq!(ty.to_string(), "G<List<int>, string[]>[]");
}

#[test]
fn rejects_malformed_references() {
    for text in ["", "G<", "G<int", "int[", "1abc", "G<int>>"] {
        assert!(TypeRef::parse(text).is_err(), "{text:?} should not parse");
    }
}

#[test]
fn error_reports_offset() {
    let err = TypeRef::parse("G<int;").unwrap_err();
    assert_eq!(err.offset, 5);
}

#[test]
fn primitive_value_types() {
    assert!(PrimitiveKind::Int.is_value_type());
    assert!(PrimitiveKind::Decimal.is_value_type());
    assert!(!PrimitiveKind::String.is_value_type());
    assert!(!PrimitiveKind::Object.is_value_type());
}

#[test]
fn deserializes_from_json_string() {
    let ty: TypeRef = serde_json::from_str("\"G<T>\"").unwrap();
    assert_eq!(ty.arity(), 1);
    assert!(serde_json::from_str::<TypeRef>("\"G<\"").is_err());
}

#[test]
fn identifiers() {
    assert!(is_identifier("Item"));
    assert!(is_identifier("_x1"));
    assert!(!is_identifier("1x"));
    assert!(!is_identifier("a b"));
    assert!(!is_identifier(""));
}
