/// Compiled pattern model — segments, slots, options and constraints.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single candidate value inside a slot option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotValue {
    /// A value name the downstream data source binds, e.g. `last_name` or
    /// `first_name[0]`.
    Name(String),
    /// The reserved `?` marker: the slot renders nothing.
    Nothing,
}

impl SlotValue {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Nothing => None,
        }
    }

    /// The data key of a name with any bracket subscripts stripped:
    /// `first_name[0]` → `first_name`.
    pub fn key(&self) -> Option<&str> {
        self.as_name()
            .map(|name| name.split_once('[').map_or(name, |(key, _)| key))
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Nothing => f.write_str("?"),
        }
    }
}

/// Eligibility rule of an option, evaluated against the names chosen
/// earlier in the same resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Unconstrained,
    /// `source>option`: eligible only if one of the names was chosen before.
    RequiresPreceding(Vec<String>),
    /// `source~option`: eligible only if none of the names was chosen before.
    ExcludesPreceding(Vec<String>),
}

impl Constraint {
    /// The constraint's source names, if any.
    pub fn sources(&self) -> &[String] {
        match self {
            Self::Unconstrained => &[],
            Self::RequiresPreceding(names) | Self::ExcludesPreceding(names) => names,
        }
    }

    pub fn is_constrained(&self) -> bool {
        !matches!(self, Self::Unconstrained)
    }
}

/// One `|`-separated alternative within a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOption {
    /// Distinct values in declaration order; never empty.
    pub values: Vec<SlotValue>,
    pub constraint: Constraint,
}

/// A `{ … }` parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub options: Vec<SlotOption>,
}

/// A segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, emitted as-is. Escaped braces are already unescaped.
    Literal(String),
    Slot(Slot),
}

/// A validated, immutable pattern. Build one with
/// [`CompiledPattern::compile`]; resolve it with a
/// [`Resolver`](crate::core::resolver::Resolver).
///
/// Serializes as its canonical pattern string and is recompiled (and
/// revalidated) on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompiledPattern {
    segments: Vec<Segment>,
}

impl CompiledPattern {
    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Slot(slot) => Some(slot),
            Segment::Literal(_) => None,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    /// Every distinct value name the pattern can emit, in declaration order.
    pub fn value_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for slot in self.slots() {
            for option in &slot.options {
                for name in option.values.iter().filter_map(SlotValue::as_name) {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }

    /// Every distinct data key the pattern can reference, subscripts stripped.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for slot in self.slots() {
            for option in &slot.options {
                for key in option.values.iter().filter_map(SlotValue::key) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
        keys
    }
}

fn write_atom<'a, I>(f: &mut fmt::Formatter<'_>, items: I, len: usize) -> fmt::Result
where
    I: Iterator<Item = &'a dyn fmt::Display>,
{
    if len > 1 {
        f.write_str("(")?;
    }
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str("|")?;
        }
        write!(f, "{item}")?;
    }
    if len > 1 {
        f.write_str(")")?;
    }
    Ok(())
}

impl fmt::Display for SlotOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.constraint {
            Constraint::Unconstrained => None,
            Constraint::RequiresPreceding(_) => Some('>'),
            Constraint::ExcludesPreceding(_) => Some('~'),
        };
        if let Some(op) = op {
            let sources = self.constraint.sources();
            write_atom(
                f,
                sources.iter().map(|s| s as &dyn fmt::Display),
                sources.len(),
            )?;
            write!(f, "{op}")?;
        }
        write_atom(
            f,
            self.values.iter().map(|v| v as &dyn fmt::Display),
            self.values.len(),
        )
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{option}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for CompiledPattern {
    /// Writes the canonical pattern syntax, re-escaping literal braces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    for c in text.chars() {
                        match c {
                            '{' => f.write_str("\\{")?,
                            '}' => f.write_str("\\}")?,
                            _ => write!(f, "{c}")?,
                        }
                    }
                }
                Segment::Slot(slot) => write!(f, "{slot}")?,
            }
        }
        Ok(())
    }
}

impl From<CompiledPattern> for String {
    fn from(pattern: CompiledPattern) -> Self {
        pattern.to_string()
    }
}
