/// Compiler and format-set integration tests.
use patterngen::{CompiledPattern, Constraint, FormatError, FormatSet, ParseErrorKind, Segment, SlotValue};

#[test]
fn names_fixture_loads() {
    let path = std::path::Path::new("tests/fixtures/names.ron");
    let formats = FormatSet::load_from_ron(path).unwrap();
    assert_eq!(formats.len(), 6);

    let expected = [
        "male_first_and_last",
        "female_first_and_last",
        "last_and_male_first",
        "init_male_first_and_last",
        "titled_name",
        "mixed_name",
    ];
    for name in &expected {
        assert!(formats.get(name).is_ok(), "Missing format: {}", name);
    }
}

#[test]
fn names_fixture_symbols_and_default() {
    let path = std::path::Path::new("tests/fixtures/names.ron");
    let formats = FormatSet::load_from_ron(path).unwrap();

    // Declared symbols are kept, the rest are derived.
    assert_eq!(formats.symbol_of("male_first_and_last"), Some("mfl"));
    assert_eq!(formats.symbol_of("init_male_first_and_last"), Some("imfal"));
    assert_eq!(formats.symbol_of("mixed_name"), Some("mn"));

    assert_eq!(formats.default_name(), Some("male_first_and_last"));
    assert_eq!(
        formats.get("default").unwrap(),
        formats.get("male_first_and_last").unwrap()
    );
}

#[test]
fn every_fixture_format_names_known_keys() {
    let path = std::path::Path::new("tests/fixtures/names.ron");
    let formats = FormatSet::load_from_ron(path).unwrap();
    let known = [
        "male_first_names",
        "female_first_names",
        "male_middle_names",
        "female_middle_names",
        "last_names",
        "title",
        "title_separator",
    ];

    for (name, pattern) in formats.iter() {
        for key in pattern.keys() {
            assert!(
                known.contains(&key),
                "Format '{}' references unknown key '{}'",
                name,
                key
            );
        }
    }
}

#[test]
fn broken_fixture_reports_the_format() {
    let path = std::path::Path::new("tests/fixtures/broken.ron");
    let err = FormatSet::load_from_ron(path).unwrap_err();
    match err {
        FormatError::Pattern { name, source } => {
            assert_eq!(name, "conditional_first");
            assert_eq!(source.kind, ParseErrorKind::ConstraintOnFirstSlot);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn missing_fixture_is_io_error() {
    let path = std::path::Path::new("tests/fixtures/does_not_exist.ron");
    assert!(matches!(
        FormatSet::load_from_ron(path),
        Err(FormatError::Io(_))
    ));
}

#[test]
fn compiled_pattern_round_trips_through_ron() {
    let pattern = CompiledPattern::compile("Dear {title|?}{title>sep}{first|(nick|alias)} \\{x\\}").unwrap();
    let serialized = ron::to_string(&pattern).unwrap();
    let deserialized: CompiledPattern = ron::from_str(&serialized).unwrap();
    assert_eq!(deserialized, pattern);
}

#[test]
fn deserializing_an_invalid_pattern_fails() {
    let result: Result<CompiledPattern, _> = ron::from_str("\"{>a}\"");
    assert!(result.is_err());
}

#[test]
fn compile_worked_example() {
    let p = CompiledPattern::compile(
        "{(_var1|var2)~(var3[0]|var4|?)|var5|var6} pops \\{\\} {var6>var7|(var6|var7)~var8|var2>(var9|var10)}",
    )
    .unwrap_err();
    // `~` in the first slot is rejected.
    assert_eq!(p.kind, ParseErrorKind::ConstraintOnFirstSlot);

    let p = CompiledPattern::compile(
        "{var5|var6} pops \\{\\} {(_var1|var2)~(var3[0]|var4|?)|var6>var7|(var6|var7)~var8|var2>(var9|var10)}",
    )
    .unwrap();
    assert_eq!(p.slot_count(), 2);
    assert_eq!(p.segments()[1], Segment::Literal(" pops {} ".to_string()));

    let slot = p.slots().nth(1).unwrap();
    assert_eq!(slot.options.len(), 4);
    assert_eq!(
        slot.options[0].constraint,
        Constraint::ExcludesPreceding(vec!["_var1".to_string(), "var2".to_string()])
    );
    assert_eq!(
        slot.options[0].values,
        vec![
            SlotValue::Name("var3[0]".to_string()),
            SlotValue::Name("var4".to_string()),
            SlotValue::Nothing,
        ]
    );
    assert_eq!(
        slot.options[3].constraint,
        Constraint::RequiresPreceding(vec!["var2".to_string()])
    );
}

#[test]
fn value_names_and_keys_in_declaration_order() {
    let p = CompiledPattern::compile("{b|a[0]|?} and {a|c[1]|b}").unwrap();
    assert_eq!(p.value_names(), vec!["b", "a[0]", "a", "c[1]"]);
    assert_eq!(p.keys(), vec!["b", "a", "c"]);
}
