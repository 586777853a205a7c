/// Resolution integration tests — seeded end-to-end pattern generation.
use patterngen::{
    CompiledPattern, FormatSet, GeneratorError, Lookback, NamingSequence, PatternGenerator, Resolver,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

fn compile(pattern: &str) -> CompiledPattern {
    CompiledPattern::compile(pattern).unwrap()
}

#[test]
fn literal_only_pattern_renders_its_text() {
    let p = compile("No slots here \\{ at all \\}");
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(p.resolve(&mut rng), "No slots here { at all }");
    }
}

#[test]
fn escaped_braces_are_never_slots() {
    let p = compile("\\{literal\\}");
    assert_eq!(p.slot_count(), 0);
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(p.resolve(&mut rng), "{literal}");
}

#[test]
fn same_seed_same_output() {
    let patterns = [
        "{a|b|c|d|e}",
        "{a|b}{a>(c|d)|b~e|?} and {(c|e)>f|g}",
        "Dear {title|?}{title>sep}{first|nick} {last}",
    ];
    for pattern in &patterns {
        let p = compile(pattern);
        for seed in 0..25 {
            let mut rng1 = StdRng::seed_from_u64(seed);
            let mut rng2 = StdRng::seed_from_u64(seed);
            assert_eq!(p.resolve(&mut rng1), p.resolve(&mut rng2));
        }
    }
}

#[test]
fn single_name_slot_always_resolves_to_it() {
    let p = compile("{only_one}");
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(p.resolve(&mut rng), "{only_one}");
    }
}

#[test]
fn requires_preceding_follows_first_slot() {
    let p = compile("{a|b}{a>c|d}");
    let mut saw_c = false;
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let out = p.resolve(&mut rng);
        match out.as_str() {
            "{a}{c}" => saw_c = true,
            "{a}{d}" | "{b}{d}" => {}
            other => panic!("unexpected output: {}", other),
        }
    }
    assert!(saw_c);
}

#[test]
fn excludes_preceding_is_the_negation() {
    let p = compile("{a|b}{a~c|d}");
    let mut outputs = HashSet::new();
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        outputs.insert(p.resolve(&mut rng));
    }
    let expected: HashSet<String> = ["{a}{d}", "{b}{c}", "{b}{d}"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(outputs, expected);
}

#[test]
fn constraints_look_at_the_whole_history() {
    let p = compile("{a|b} {x|y} {a>c|d}");
    let resolver = Resolver::default();
    let mut saw_c = false;
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let resolution = resolver.resolve(&p, &mut rng);
        let chosen: Vec<&str> = resolution.chosen().collect();
        if chosen[2] == "c" {
            saw_c = true;
            assert_eq!(chosen[0], "a");
        }
        if chosen[0] == "b" {
            assert_eq!(chosen[2], "d");
        }
    }
    assert!(saw_c);
}

#[test]
fn previous_slot_lookback_only_sees_the_adjacent_slot() {
    let p = compile("{a|b} {x|y} {a>c|d}");
    let resolver = Resolver::new(Lookback::PreviousSlot);
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let out = resolver.resolve(&p, &mut rng).render();
        assert!(out.ends_with("{d}"), "unexpected output: {}", out);
    }
}

#[test]
fn optional_marker_sometimes_renders_nothing() {
    let p = compile("{a|?}");
    let outputs: HashSet<String> = (0..100)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            p.resolve(&mut rng)
        })
        .collect();
    assert!(outputs.contains(""));
    assert!(outputs.contains("{a}"));
    assert_eq!(outputs.len(), 2);
}

#[test]
fn duplicate_names_do_not_skew_the_draw() {
    let p = compile("{a|(a|b)}");
    let mut rng = StdRng::seed_from_u64(2024);
    let draws = 20_000;
    let mut count_a = 0u32;
    let mut count_b = 0u32;
    for _ in 0..draws {
        match p.resolve(&mut rng).as_str() {
            "{a}" => count_a += 1,
            "{b}" => count_b += 1,
            other => panic!("unexpected output: {}", other),
        }
    }

    // Chi-square against a uniform split; 10.83 is the p = 0.001 critical
    // value for one degree of freedom.
    let expected = draws as f64 / 2.0;
    let chi_square = [count_a, count_b]
        .iter()
        .map(|&observed| (observed as f64 - expected).powi(2) / expected)
        .sum::<f64>();
    assert!(
        chi_square < 10.83,
        "a={} b={} chi_square={}",
        count_a,
        count_b,
        chi_square
    );
}

#[test]
fn empty_candidate_set_is_not_an_error() {
    let p = compile("{a} {b>c} end");
    let mut rng = StdRng::seed_from_u64(11);
    assert_eq!(p.resolve(&mut rng), "{a}  end");
}

#[test]
fn independent_rngs_resolve_concurrently() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompiledPattern>();

    let pattern = Arc::new(compile("{a|b|c}{a>(d|e)|b~f|?}{g|h}"));
    let expected: Vec<Vec<String>> = (0..4u64)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50).map(|_| pattern.resolve(&mut rng)).collect()
        })
        .collect();

    let handles: Vec<_> = (0..4u64)
        .map(|seed| {
            let pattern = Arc::clone(&pattern);
            std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..50).map(|_| pattern.resolve(&mut rng)).collect::<Vec<_>>()
            })
        })
        .collect();

    for (handle, expected) in handles.into_iter().zip(expected) {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn generator_is_deterministic_per_seed() {
    let build = || {
        PatternGenerator::builder()
            .pattern("{male|female} {male>male_name|female>female_name} {last|?}")
            .seed(42)
            .build()
            .unwrap()
    };
    let mut g1 = build();
    let mut g2 = build();
    let v1 = g1.generate_many(30).unwrap();
    let v2 = g2.generate_many(30).unwrap();
    assert_eq!(v1, v2);

    for out in &v1 {
        let consistent = (out.starts_with("{male} {male_name}")
            || out.starts_with("{female} {female_name}"))
            && (out.ends_with("{last}") || out.ends_with(' '));
        assert!(consistent, "inconsistent output: {}", out);
    }
}

#[test]
fn generator_uses_formats_from_a_set() {
    let path = std::path::Path::new("tests/fixtures/names.ron");
    let formats = FormatSet::load_from_ron(path).unwrap();

    let mut names = NamingSequence::new();
    let mut generator = PatternGenerator::builder()
        .name(names.next_name("NameGenerator"))
        .seed(7)
        .build()
        .unwrap();
    assert_eq!(generator.name(), "NameGenerator0");

    assert_eq!(
        generator.generate_format(&formats, "default").unwrap(),
        "{male_first_names} {last_names}"
    );
    assert_eq!(
        generator.generate_format(&formats, "imfal").unwrap(),
        "{male_first_names[0]}. {last_names}"
    );

    for _ in 0..50 {
        let out = generator.generate_format(&formats, "mixed_name").unwrap();
        assert!(!out.contains("{male_first_names} {female_middle_names}"));
        assert!(!out.contains("{female_first_names} {male_middle_names}"));
    }

    assert!(matches!(
        generator.generate_format(&formats, "unknown"),
        Err(GeneratorError::Format(_))
    ));
}

#[test]
fn uncompiled_generator_reports_state_error() {
    let mut generator = PatternGenerator::builder().name("empty").build().unwrap();
    match generator.generate() {
        Err(GeneratorError::NotCompiled(name)) => assert_eq!(name, "empty"),
        other => panic!("expected NotCompiled, got {:?}", other),
    }
}
