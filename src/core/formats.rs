/// Format sets — named, compiled patterns with short symbols and a default.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::compiler::ParseError;
use crate::schema::pattern::CompiledPattern;

/// Name under which the default format is requested.
pub const DEFAULT_FORMAT: &str = "default";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("format '{name}': {source}")]
    Pattern { name: String, source: ParseError },
    #[error("'default' is a reserved format name")]
    ReservedName,
    #[error("'{0}' is not an available symbol or format name")]
    FormatNotFound(String),
    #[error("no default format is set")]
    NoDefaultFormat,
    #[error("can't create symbol '{symbol}' for format '{format}': symbol already exists")]
    DuplicateSymbol { symbol: String, format: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A set of named patterns, e.g. the formats a name generator offers.
#[derive(Debug, Clone, Default)]
pub struct FormatSet {
    formats: BTreeMap<String, CompiledPattern>,
    /// symbol → format name
    symbols: BTreeMap<String, String>,
    default: Option<String>,
}

// RON deserialization helper: patterns arrive as strings and are compiled
// one by one so that errors can name the offending format.
#[derive(Debug, Deserialize)]
#[serde(rename = "FormatSet")]
struct RonFormatSet {
    formats: BTreeMap<String, String>,
    #[serde(default)]
    symbols: BTreeMap<String, String>,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    generate_symbols: bool,
    #[serde(default)]
    ignore_symbol_errors: bool,
}

impl FormatSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a format set from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<FormatSet, FormatError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a format set from a RON string, compiling every pattern.
    pub fn parse_ron(input: &str) -> Result<FormatSet, FormatError> {
        let raw: RonFormatSet = ron::from_str(input)?;
        let mut set = FormatSet::new();

        for (name, pattern) in &raw.formats {
            set.insert(name, pattern)?;
        }
        for (symbol, name) in &raw.symbols {
            set.add_symbol(symbol, name)?;
        }
        if raw.generate_symbols {
            set.generate_symbols(raw.ignore_symbol_errors)?;
        }
        if let Some(ref default) = raw.default {
            set.set_default(default)?;
        }

        debug!(
            formats = set.formats.len(),
            symbols = set.symbols.len(),
            "loaded format set"
        );
        Ok(set)
    }

    /// Compile `pattern` and add it under `name`, replacing any previous
    /// format of that name.
    pub fn insert(&mut self, name: &str, pattern: &str) -> Result<(), FormatError> {
        if name == DEFAULT_FORMAT {
            return Err(FormatError::ReservedName);
        }
        let compiled = CompiledPattern::compile(pattern).map_err(|source| FormatError::Pattern {
            name: name.to_string(),
            source,
        })?;
        self.formats.insert(name.to_string(), compiled);
        Ok(())
    }

    /// Register `symbol` as an abbreviation of the format `name`.
    pub fn add_symbol(&mut self, symbol: &str, name: &str) -> Result<(), FormatError> {
        if !self.formats.contains_key(name) {
            return Err(FormatError::FormatNotFound(name.to_string()));
        }
        match self.symbols.get(symbol) {
            Some(existing) if existing != name => Err(FormatError::DuplicateSymbol {
                symbol: symbol.to_string(),
                format: name.to_string(),
            }),
            _ => {
                self.symbols.insert(symbol.to_string(), name.to_string());
                Ok(())
            }
        }
    }

    /// Derive a symbol for every format that has none: the first letter of
    /// each `_`-separated word, so `first_and_last` becomes `fal`.
    ///
    /// A derived symbol that is already taken is an error unless
    /// `ignore_errors` is set, in which case that format stays unsymbolised.
    pub fn generate_symbols(&mut self, ignore_errors: bool) -> Result<(), FormatError> {
        let unsymbolised: Vec<String> = self
            .formats
            .keys()
            .filter(|name| self.symbol_of(name).is_none())
            .cloned()
            .collect();

        for name in unsymbolised {
            let symbol = derive_symbol(&name);
            if symbol.is_empty() {
                continue;
            }
            if self.symbols.contains_key(&symbol) {
                if ignore_errors {
                    warn!(symbol = %symbol, format = %name, "skipping taken symbol");
                    continue;
                }
                return Err(FormatError::DuplicateSymbol {
                    symbol,
                    format: name,
                });
            }
            self.symbols.insert(symbol, name);
        }
        Ok(())
    }

    /// Set the default format by name or symbol.
    pub fn set_default(&mut self, name_or_symbol: &str) -> Result<(), FormatError> {
        let name = self
            .resolve_name(name_or_symbol)
            .ok_or_else(|| FormatError::FormatNotFound(name_or_symbol.to_string()))?
            .to_string();
        self.default = Some(name);
        Ok(())
    }

    /// Map a symbol or a format name to the format name. Symbols win.
    pub fn resolve_name<'a>(&'a self, name_or_symbol: &'a str) -> Option<&'a str> {
        if let Some(name) = self.symbols.get(name_or_symbol) {
            return Some(name.as_str());
        }
        self.formats
            .contains_key(name_or_symbol)
            .then_some(name_or_symbol)
    }

    /// Look a format up by name or symbol; `"default"` returns the default.
    pub fn get(&self, name_or_symbol: &str) -> Result<&CompiledPattern, FormatError> {
        if name_or_symbol == DEFAULT_FORMAT {
            return self.default_format();
        }
        self.resolve_name(name_or_symbol)
            .and_then(|name| self.formats.get(name))
            .ok_or_else(|| FormatError::FormatNotFound(name_or_symbol.to_string()))
    }

    pub fn default_format(&self) -> Result<&CompiledPattern, FormatError> {
        self.default
            .as_deref()
            .and_then(|name| self.formats.get(name))
            .ok_or(FormatError::NoDefaultFormat)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn symbol_of(&self, name: &str) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(_, target)| target.as_str() == name)
            .map(|(symbol, _)| symbol.as_str())
    }

    /// Every `(name, symbol)` pair, sorted by name.
    pub fn names(&self) -> Vec<(&str, Option<&str>)> {
        self.formats
            .keys()
            .map(|name| (name.as_str(), self.symbol_of(name)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompiledPattern)> {
        self.formats.iter().map(|(name, pattern)| (name.as_str(), pattern))
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Merge another format set into this one. Formats, symbols and the
    /// default from `other` override those in `self`.
    pub fn merge(&mut self, other: FormatSet) {
        self.formats.extend(other.formats);
        self.symbols.extend(other.symbols);
        if other.default.is_some() {
            self.default = other.default;
        }
    }
}

fn derive_symbol(name: &str) -> String {
    name.split('_')
        .filter_map(|word| word.chars().next())
        .collect()
}
