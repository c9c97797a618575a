use super::*;

#[test]
fn span_len_and_empty() {
    assert_eq!(Span::new(3, 10).len(), 7);
    assert!(Span::at(5).is_empty());
    assert!(!Span::new(5, 6).is_empty());
}

#[test]
fn overlapping_spans_intersect() {
    assert!(Span::new(0, 10).intersects(Span::new(5, 15)));
    assert!(!Span::new(0, 10).intersects(Span::new(10, 15)));
    assert!(Span::at(4).intersects(Span::new(0, 10)));
    assert!(Span::new(0, 10).intersects(Span::at(9)));
}

#[test]
fn locations_in_different_files_never_intersect() {
    let a = Location::new("a.sm", 0, 10);
    let b = Location::new("b.sm", 0, 10);
    assert!(!a.intersects(&b));
    assert!(a.intersects(&Location::new("a.sm", 9, 12)));
}

#[test]
fn locations_order_by_file_then_start() {
    let mut locs = vec![
        Location::new("b.sm", 0, 1),
        Location::new("a.sm", 20, 21),
        Location::new("a.sm", 2, 3),
    ];
    locs.sort();
    let starts: Vec<_> = locs.iter().map(|l| (l.file.to_string(), l.start())).collect();
    assert_eq!(
        starts,
        vec![
            ("a.sm".to_string(), 2),
            ("a.sm".to_string(), 20),
            ("b.sm".to_string(), 0)
        ]
    );
}

#[test]
fn location_deserializes_flattened_span() {
    let loc: Location = serde_json::from_str(r#"{"file":"x.sm","start":4,"end":9}"#).unwrap();
    assert_eq!(loc, Location::new("x.sm", 4, 9));
    assert_eq!(loc.to_string(), "x.sm:4");
}
