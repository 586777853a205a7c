/// Pattern generator — a seeded, named façade over compile + resolve.
///
/// Downstream data generators hold one `PatternGenerator` per format
/// string, call `generate` once per sample and substitute the `{name}`
/// markers with values of their own.
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::core::compiler::ParseError;
use crate::core::formats::{FormatError, FormatSet};
use crate::core::resolver::{Lookback, Resolver};
use crate::schema::pattern::CompiledPattern;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("pattern error: {0}")]
    Parse(#[from] ParseError),
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("generator '{0}' has no compiled pattern")]
    NotCompiled(String),
}

/// Hands out sequential instance names per kind: `PatternGenerator0`,
/// `PatternGenerator1`, … Passed explicitly wherever names are generated.
#[derive(Debug, Clone, Default)]
pub struct NamingSequence {
    counters: HashMap<String, u64>,
}

impl NamingSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self, kind: &str) -> String {
        let counter = self.counters.entry(kind.to_string()).or_insert(0);
        let name = format!("{}{}", kind, counter);
        *counter += 1;
        name
    }
}

/// A stateful generator owning its RNG.
///
/// `generate` takes `&mut self`: each call advances the RNG, so one
/// instance is never shared across threads without external locking. For
/// concurrent use, share the `CompiledPattern` and give each thread its own
/// RNG and [`Resolver`].
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    name: String,
    pattern: Option<CompiledPattern>,
    resolver: Resolver,
    seed: Option<u64>,
    rng: StdRng,
}

/// Builder for constructing a `PatternGenerator`.
pub struct PatternGeneratorBuilder {
    name: Option<String>,
    pattern: Option<String>,
    seed: Option<u64>,
    lookback: Lookback,
}

impl PatternGenerator {
    pub fn builder() -> PatternGeneratorBuilder {
        PatternGeneratorBuilder {
            name: None,
            pattern: None,
            seed: None,
            lookback: Lookback::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> Option<&CompiledPattern> {
        self.pattern.as_ref()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn lookback(&self) -> Lookback {
        self.resolver.lookback()
    }

    /// Compile `pattern` and make it the generator's pattern. On error the
    /// previous pattern is kept.
    pub fn compile(&mut self, pattern: &str) -> Result<(), GeneratorError> {
        let compiled = CompiledPattern::compile(pattern)?;
        debug!(generator = %self.name, slots = compiled.slot_count(), "pattern set");
        self.pattern = Some(compiled);
        Ok(())
    }

    /// Generate one rendered instance of the pattern.
    pub fn generate(&mut self) -> Result<String, GeneratorError> {
        let pattern = self
            .pattern
            .as_ref()
            .ok_or_else(|| GeneratorError::NotCompiled(self.name.clone()))?;
        Ok(self.resolver.resolve(pattern, &mut self.rng).render())
    }

    /// Generate `k` rendered instances.
    pub fn generate_many(&mut self, k: usize) -> Result<Vec<String>, GeneratorError> {
        let mut results = Vec::with_capacity(k);
        for _ in 0..k {
            results.push(self.generate()?);
        }
        Ok(results)
    }

    /// Generate one instance of a named format (or symbol, or `"default"`)
    /// from `formats`, drawing from this generator's RNG.
    pub fn generate_format(
        &mut self,
        formats: &FormatSet,
        name: &str,
    ) -> Result<String, GeneratorError> {
        let pattern = formats.get(name)?;
        Ok(self.resolver.resolve(pattern, &mut self.rng).render())
    }

    /// Recreate the RNG from `seed`. The generator then produces the same
    /// sequence as a fresh one built with that seed.
    pub fn reset_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
    }
}

impl PatternGeneratorBuilder {
    /// Explicit instance name; see [`NamingSequence`] for generated ones.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn lookback(mut self, lookback: Lookback) -> Self {
        self.lookback = lookback;
        self
    }

    /// Build the generator, compiling the pattern if one was given. Without
    /// a seed the RNG is seeded from system entropy.
    pub fn build(self) -> Result<PatternGenerator, GeneratorError> {
        let pattern = self
            .pattern
            .as_deref()
            .map(CompiledPattern::compile)
            .transpose()?;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(PatternGenerator {
            name: self.name.unwrap_or_else(|| "PatternGenerator".to_string()),
            pattern,
            resolver: Resolver::new(self.lookback),
            seed: self.seed,
            rng,
        })
    }
}
