/// Constrained sampler — resolves a compiled pattern into concrete pieces.
///
/// A resolution walks the segments left to right. Each slot filters its
/// options against the names chosen so far, flattens the eligible values
/// into a deduplicated candidate list and draws one uniformly.
use rand::Rng;
use rustc_hash::FxHashSet;
use std::str::FromStr;
use tracing::trace;

use crate::core::render::Renderer;
use crate::schema::pattern::{CompiledPattern, Constraint, Segment, Slot, SlotValue};

/// How far back a precedence constraint looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookback {
    /// Every name chosen earlier in the same resolution.
    #[default]
    History,
    /// Only the name chosen by the immediately preceding slot. A preceding
    /// slot that resolved to nothing matches no source name.
    PreviousSlot,
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "history" => Ok(Self::History),
            "previous" | "previous_slot" => Ok(Self::PreviousSlot),
            other => Err(format!(
                "unknown lookback '{}': expected 'history' or 'previous'",
                other
            )),
        }
    }
}

/// Names chosen so far in one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionHistory<'p> {
    chosen: FxHashSet<&'p str>,
    previous: Option<&'p str>,
}

impl<'p> ResolutionHistory<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value drawn for a slot; `None` when `?` was drawn. A slot
    /// with no eligible candidates draws nothing and is not recorded.
    pub fn record(&mut self, choice: Option<&'p str>) {
        if let Some(name) = choice {
            self.chosen.insert(name);
        }
        self.previous = choice;
    }

    pub fn contains(&self, name: &str, lookback: Lookback) -> bool {
        match lookback {
            Lookback::History => self.chosen.contains(name),
            Lookback::PreviousSlot => self.previous == Some(name),
        }
    }

    fn contains_any(&self, names: &[String], lookback: Lookback) -> bool {
        names.iter().any(|name| self.contains(name, lookback))
    }
}

/// One resolved piece of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'p> {
    Literal(&'p str),
    /// A chosen value name, rendered as a `{name}` marker.
    Value(&'p str),
    /// A slot that resolved to `?` or had no eligible candidate.
    Nothing,
}

/// The outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'p> {
    pieces: Vec<Piece<'p>>,
}

impl<'p> Resolution<'p> {
    pub fn pieces(&self) -> &[Piece<'p>] {
        &self.pieces
    }

    /// The value names chosen, in slot order.
    pub fn chosen(&self) -> impl Iterator<Item = &'p str> + '_ {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Value(name) => Some(*name),
            Piece::Literal(_) | Piece::Nothing => None,
        })
    }

    pub fn render(&self) -> String {
        Renderer::render(self)
    }
}

/// Resolves compiled patterns. Holds no RNG state: callers pass their own,
/// so one pattern can be resolved from several independent RNG streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    lookback: Lookback,
}

impl Resolver {
    pub fn new(lookback: Lookback) -> Self {
        Self { lookback }
    }

    pub fn lookback(&self) -> Lookback {
        self.lookback
    }

    /// Run one resolution pass with a fresh history.
    pub fn resolve<'p, R: Rng + ?Sized>(
        &self,
        pattern: &'p CompiledPattern,
        rng: &mut R,
    ) -> Resolution<'p> {
        let mut history = ResolutionHistory::new();
        let mut pieces = Vec::with_capacity(pattern.segments().len());

        for (index, segment) in pattern.segments().iter().enumerate() {
            match segment {
                Segment::Literal(text) => pieces.push(Piece::Literal(text.as_str())),
                Segment::Slot(slot) => {
                    let candidates = self.candidates(slot, &history);
                    if candidates.is_empty() {
                        trace!(segment = index, "no eligible candidates");
                        pieces.push(Piece::Nothing);
                        continue;
                    }

                    let choice = candidates[rng.gen_range(0..candidates.len())];
                    trace!(
                        segment = index,
                        candidates = candidates.len(),
                        choice = %choice,
                        "resolved slot"
                    );
                    let drawn = choice.as_name();
                    history.record(drawn);
                    pieces.push(drawn.map_or(Piece::Nothing, Piece::Value));
                }
            }
        }

        Resolution { pieces }
    }

    /// The deduplicated candidates of a slot given the history so far, in
    /// declaration order.
    pub fn candidates<'p>(&self, slot: &'p Slot, history: &ResolutionHistory<'_>) -> Vec<&'p SlotValue> {
        let mut candidates: Vec<&SlotValue> = Vec::new();
        for option in &slot.options {
            if !self.is_eligible(&option.constraint, history) {
                continue;
            }
            for value in &option.values {
                if !candidates.contains(&value) {
                    candidates.push(value);
                }
            }
        }
        candidates
    }

    fn is_eligible(&self, constraint: &Constraint, history: &ResolutionHistory<'_>) -> bool {
        match constraint {
            Constraint::Unconstrained => true,
            Constraint::RequiresPreceding(names) => history.contains_any(names, self.lookback),
            Constraint::ExcludesPreceding(names) => !history.contains_any(names, self.lookback),
        }
    }
}

impl CompiledPattern {
    /// Resolve and render once with the default resolver.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        Resolver::default().resolve(self, rng).render()
    }
}
