/// Format Linter — validates format sets and flags constraints that can never matter.
///
/// Usage: format_linter <format_file_or_dir>

use patterngen::{CompiledPattern, Constraint, FormatSet};
use std::collections::HashSet;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: format_linter <format_file_or_dir>");
        process::exit(0);
    }

    let root = Path::new(&args[1]);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut sets = Vec::new();

    if root.is_file() {
        load_format_set(root, &mut sets, &mut errors);
    } else if root.is_dir() {
        load_format_sets_recursive(root, &mut sets, &mut errors);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    let total: usize = sets.iter().map(|(_, set)| set.len()).sum();
    println!("Loaded {} formats from {} files", total, sets.len());

    for (file, set) in &sets {
        if set.is_empty() {
            warnings.push(format!("{}: no formats defined", file));
        }
        for (name, pattern) in set.iter() {
            for warning in lint_pattern(pattern) {
                warnings.push(format!("{}: format '{}': {}", file, name, warning));
            }
        }
    }

    println!("\n=== Format Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_format_set(path: &Path, sets: &mut Vec<(String, FormatSet)>, errors: &mut Vec<String>) {
    match FormatSet::load_from_ron(path) {
        Ok(set) => {
            println!("  Loaded: {}", path.display());
            sets.push((path.display().to_string(), set));
        }
        Err(e) => errors.push(format!("{}: {}", path.display(), e)),
    }
}

fn load_format_sets_recursive(
    dir: &Path,
    sets: &mut Vec<(String, FormatSet)>,
    errors: &mut Vec<String>,
) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_format_sets_recursive(&path, sets, errors);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                load_format_set(&path, sets, errors);
            }
        }
    }
}

/// Warnings for a compiled pattern that is valid but probably not what
/// its author meant.
fn lint_pattern(pattern: &CompiledPattern) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut earlier: HashSet<&str> = HashSet::new();

    if pattern.slot_count() == 0 {
        warnings.push("pattern has no slots".to_string());
    }

    for (index, slot) in pattern.slots().enumerate() {
        if slot
            .options
            .iter()
            .all(|o| o.values.iter().all(|v| v.is_nothing()))
        {
            warnings.push(format!("slot {} can only render nothing", index));
        } else if slot.options.iter().all(|o| o.constraint.is_constrained()) {
            warnings.push(format!(
                "slot {} has no unconstrained option and may render nothing",
                index
            ));
        }

        for option in &slot.options {
            let sources = option.constraint.sources();
            if sources.iter().any(|s| earlier.contains(s.as_str())) {
                continue;
            }
            let effect = match option.constraint {
                Constraint::RequiresPreceding(_) => "is never eligible",
                Constraint::ExcludesPreceding(_) => "is always eligible",
                Constraint::Unconstrained => continue,
            };
            warnings.push(format!(
                "slot {}: no source of '{}' appears in an earlier slot, so it {}",
                index, option, effect
            ));
        }

        for option in &slot.options {
            earlier.extend(option.values.iter().filter_map(|v| v.as_name()));
        }
    }

    warnings
}
