//! patterngen — a pattern compiler and constrained sampler.
//!
//! Compiles pattern strings such as `"{first|(nick|alias)} {first>last|?}"`
//! into an immutable [`CompiledPattern`] and resolves them, one seeded draw
//! at a time, into strings of `{name}` substitution markers for a downstream
//! data-binding step.

pub mod core;
pub mod schema;

pub use crate::core::compiler::{ParseError, ParseErrorKind};
pub use crate::core::formats::{FormatError, FormatSet};
pub use crate::core::generator::{
    GeneratorError, NamingSequence, PatternGenerator, PatternGeneratorBuilder,
};
pub use crate::core::resolver::{Lookback, Piece, Resolution, ResolutionHistory, Resolver};
pub use crate::schema::pattern::{
    CompiledPattern, Constraint, Segment, Slot, SlotOption, SlotValue,
};
