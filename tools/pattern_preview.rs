/// Pattern Preview — generate rendered samples from a pattern or a format set.
///
/// Usage: pattern_preview (--pattern <p> | --formats <file.ron> [--format <name>])
///                        [--seed <n>] [--count <n>] [--lookback history|previous] [--stats]

use patterngen::{FormatSet, Lookback, PatternGenerator};
use std::collections::BTreeMap;
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
        print_usage();
        return;
    }

    let mut pattern = None;
    let mut formats_path = None;
    let mut format_name = "default".to_string();
    let mut seed: u64 = 42;
    let mut count: usize = 10;
    let mut lookback = Lookback::History;
    let mut stats = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pattern" if i + 1 < args.len() => {
                i += 1;
                pattern = Some(args[i].clone());
            }
            "--formats" if i + 1 < args.len() => {
                i += 1;
                formats_path = Some(args[i].clone());
            }
            "--format" if i + 1 < args.len() => {
                i += 1;
                format_name = args[i].clone();
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = parse_or_exit("--seed", &args[i]);
            }
            "--count" if i + 1 < args.len() => {
                i += 1;
                count = parse_or_exit("--count", &args[i]);
            }
            "--lookback" if i + 1 < args.len() => {
                i += 1;
                lookback = match args[i].parse() {
                    Ok(lookback) => lookback,
                    Err(e) => {
                        eprintln!("ERROR: {}", e);
                        process::exit(1);
                    }
                };
            }
            "--stats" => stats = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut generator = match PatternGenerator::builder()
        .name("preview")
        .seed(seed)
        .lookback(lookback)
        .build()
    {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    let samples = match (pattern, formats_path) {
        (Some(pattern), None) => {
            if let Err(e) = generator.compile(&pattern) {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
            generator.generate_many(count)
        }
        (None, Some(path)) => {
            let formats = match FormatSet::load_from_ron(Path::new(&path)) {
                Ok(formats) => formats,
                Err(e) => {
                    eprintln!("ERROR: Failed to load format set: {}", e);
                    process::exit(1);
                }
            };
            (0..count)
                .map(|_| generator.generate_format(&formats, &format_name))
                .collect()
        }
        _ => {
            eprintln!("ERROR: Pass exactly one of --pattern or --formats");
            print_usage();
            process::exit(1);
        }
    };

    let samples = match samples {
        Ok(samples) => samples,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    for sample in &samples {
        println!("{}", sample);
    }

    if stats {
        print_stats(&samples);
    }
}

fn parse_or_exit<T>(flag: &str, value: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("ERROR: invalid {} '{}': {}", flag, value, e);
            process::exit(1);
        }
    }
}

fn print_stats(samples: &[String]) {
    let mut frequencies: BTreeMap<&str, usize> = BTreeMap::new();
    for sample in samples {
        *frequencies.entry(sample.as_str()).or_default() += 1;
    }

    println!("\n=== Variety ===\n");
    println!(
        "{} samples, {} distinct outputs",
        samples.len(),
        frequencies.len()
    );
    let mut ranked: Vec<(&str, usize)> = frequencies.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (output, n) in ranked {
        let share = n as f64 / samples.len() as f64 * 100.0;
        println!("{:>6} {:>5.1}%  {:?}", n, share, output);
    }
}

fn print_usage() {
    println!(
        "Usage: pattern_preview (--pattern <p> | --formats <file.ron> [--format <name>])\n\
         \x20                      [--seed <n>] [--count <n>] [--lookback history|previous] [--stats]"
    );
}
