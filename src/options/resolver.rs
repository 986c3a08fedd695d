//! Layered precedence resolution for build options.
//!
//! Every registered option resolves to exactly one value per process
//! invocation, taken from the highest-precedence source that supplies
//! one:
//!
//! 1. CLI flag (explicitly passed this invocation)
//! 2. Config file value
//! 3. Built-in default
//!
//! Resolution walks the registry in registration order, so resolving the
//! same inputs twice produces byte-identical output. The resolved
//! snapshot is read-only; validation happens after the full set is
//! resolved and never mutates it.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::Result;
use crate::config::FileConfig;
use crate::options::registry::{OptionField, OptionKind, OptionRegistry, OptionValue};
use crate::options::validator::{DependencyGroup, validate};

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Value from CLI flag
    #[serde(rename = "cli")]
    CliFlag,
    /// Value from the config file
    File,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::File => write!(f, "file"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A single resolved option with its source.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedValue {
    /// Fully-qualified dotted key
    pub key: String,
    /// Kind declared at registration
    pub kind: OptionKind,
    /// The winning value
    pub value: OptionValue,
    /// Which layer supplied the value
    pub source: ValueSource,
}

/// Raw values the CLI surface captured for explicitly-passed flags.
///
/// Flags left untouched by the user do not appear here at all, which is
/// what lets the resolver distinguish "flag passed" from "flag at
/// default" without comparing values.
#[derive(Debug, Clone, Default)]
pub struct CliValues {
    values: HashMap<String, CliRaw>,
}

/// One flag's raw occurrence(s) on the command line.
#[derive(Debug, Clone)]
pub enum CliRaw {
    /// Single-occurrence flag value
    Single(String),
    /// Repeatable flag occurrences, in order
    Many(Vec<String>),
}

impl CliValues {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single-value flag, keyed by fully-qualified key.
    pub fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), CliRaw::Single(value));
    }

    /// Record a repeatable flag's occurrences, keyed by fully-qualified key.
    pub fn append(&mut self, key: &str, occurrences: Vec<String>) {
        self.values.insert(key.to_string(), CliRaw::Many(occurrences));
    }

    /// The raw value(s) for `key`, if the flag was passed.
    pub fn get(&self, key: &str) -> Option<&CliRaw> {
        self.values.get(key)
    }

    /// Whether no flags were captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable snapshot of every registered option, in registration order.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ResolvedOptions {
    values: Vec<ResolvedValue>,
    #[serde(skip)]
    by_key: HashMap<String, usize>,
}

impl ResolvedOptions {
    /// Resolve and validate in one step.
    ///
    /// This is the only path that yields a snapshot fit for downstream
    /// consumers: a dependency violation fails the whole step before any
    /// value escapes.
    pub fn load(
        registry: &OptionRegistry,
        file: &FileConfig,
        cli: &CliValues,
        groups: &[DependencyGroup],
    ) -> Result<Self> {
        let resolved = resolve(registry, file, cli)?;
        validate(&resolved, registry, groups)?;
        Ok(resolved)
    }

    /// Look up a resolved value by fully-qualified key.
    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.by_key.get(key).map(|&i| &self.values[i])
    }

    /// All resolved values, in registration order.
    pub fn values(&self) -> &[ResolvedValue] {
        &self.values
    }

    /// The source layer that supplied `key`, if registered.
    pub fn source(&self, key: &str) -> Option<ValueSource> {
        self.get(key).map(|r| r.source)
    }

    /// Get a boolean option.
    pub fn bool_value(&self, key: &str) -> Result<bool> {
        let resolved = self.require(key)?;
        resolved.value.as_bool().ok_or_else(|| crate::Error::TypeMismatch {
            key: key.to_string(),
            expected: OptionKind::Bool,
        })
    }

    /// Get a string option.
    pub fn str_value(&self, key: &str) -> Result<&str> {
        let resolved = self.require(key)?;
        resolved.value.as_str().ok_or_else(|| crate::Error::TypeMismatch {
            key: key.to_string(),
            expected: OptionKind::Str,
        })
    }

    /// Get an integer option.
    pub fn int_value(&self, key: &str) -> Result<i64> {
        let resolved = self.require(key)?;
        resolved.value.as_int().ok_or_else(|| crate::Error::TypeMismatch {
            key: key.to_string(),
            expected: OptionKind::Int,
        })
    }

    /// Get a string-list option.
    pub fn list_value(&self, key: &str) -> Result<&[String]> {
        let resolved = self.require(key)?;
        resolved.value.as_list().ok_or_else(|| crate::Error::TypeMismatch {
            key: key.to_string(),
            expected: OptionKind::List,
        })
    }

    /// Get a string-map option.
    pub fn map_value(&self, key: &str) -> Result<&BTreeMap<String, String>> {
        let resolved = self.require(key)?;
        resolved.value.as_map().ok_or_else(|| crate::Error::TypeMismatch {
            key: key.to_string(),
            expected: OptionKind::Map,
        })
    }

    fn require(&self, key: &str) -> Result<&ResolvedValue> {
        self.get(key)
            .ok_or_else(|| crate::Error::UnknownKey(key.to_string()))
    }
}

/// Resolve every registered option from its source layers.
///
/// Precedence (highest wins): CLI flag > config file > default.
pub fn resolve(
    registry: &OptionRegistry,
    file: &FileConfig,
    cli: &CliValues,
) -> Result<ResolvedOptions> {
    let mut values = Vec::with_capacity(registry.len());
    let mut by_key = HashMap::with_capacity(registry.len());

    for field in registry.fields() {
        let mut value = field.default.clone();
        let mut source = ValueSource::Default;

        if let Some(raw) = file.lookup(&field.key) {
            value = coerce_file_value(field, raw)?;
            source = ValueSource::File;
        }

        if let Some(raw) = cli.get(&field.key) {
            value = coerce_cli_value(field, raw)?;
            source = ValueSource::CliFlag;
        }

        by_key.insert(field.key.clone(), values.len());
        values.push(ResolvedValue {
            key: field.key.clone(),
            kind: field.kind,
            value,
            source,
        });
    }

    Ok(ResolvedOptions { values, by_key })
}

fn type_mismatch(field: &OptionField) -> crate::Error {
    crate::Error::TypeMismatch {
        key: field.key.clone(),
        expected: field.kind,
    }
}

/// Coerce a TOML value from the config file to the field's declared kind.
///
/// Lists accept either a native array of strings or a single
/// comma-delimited string; maps accept either a native table of strings
/// or a `k=v` comma/semicolon-delimited string.
fn coerce_file_value(field: &OptionField, raw: &toml::Value) -> Result<OptionValue> {
    match field.kind {
        OptionKind::Bool => raw
            .as_bool()
            .map(OptionValue::Bool)
            .ok_or_else(|| type_mismatch(field)),
        OptionKind::Str => raw
            .as_str()
            .map(OptionValue::str)
            .ok_or_else(|| type_mismatch(field)),
        OptionKind::Int => raw
            .as_integer()
            .map(OptionValue::Int)
            .ok_or_else(|| type_mismatch(field)),
        OptionKind::List => match raw {
            toml::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let s = item.as_str().ok_or_else(|| type_mismatch(field))?;
                    list.push(s.to_string());
                }
                Ok(OptionValue::List(list))
            }
            toml::Value::String(s) => Ok(OptionValue::List(split_list(s))),
            _ => Err(type_mismatch(field)),
        },
        OptionKind::Map => match raw {
            toml::Value::Table(table) => {
                let mut map = BTreeMap::new();
                for (k, v) in table {
                    let s = v.as_str().ok_or_else(|| type_mismatch(field))?;
                    map.insert(k.clone(), s.to_string());
                }
                Ok(OptionValue::Map(map))
            }
            toml::Value::String(s) => parse_map(field, s),
            _ => Err(type_mismatch(field)),
        },
    }
}

/// Coerce raw CLI string(s) to the field's declared kind.
fn coerce_cli_value(field: &OptionField, raw: &CliRaw) -> Result<OptionValue> {
    let occurrences: Vec<&str> = match raw {
        CliRaw::Single(s) => vec![s.as_str()],
        CliRaw::Many(items) => items.iter().map(String::as_str).collect(),
    };

    match field.kind {
        OptionKind::Bool => {
            let s = single_occurrence(field, &occurrences)?;
            match s.to_lowercase().as_str() {
                "true" => Ok(OptionValue::Bool(true)),
                "false" => Ok(OptionValue::Bool(false)),
                _ => Err(type_mismatch(field)),
            }
        }
        OptionKind::Str => {
            let s = single_occurrence(field, &occurrences)?;
            Ok(OptionValue::str(s))
        }
        OptionKind::Int => {
            let s = single_occurrence(field, &occurrences)?;
            s.parse::<i64>()
                .map(OptionValue::Int)
                .map_err(|_| type_mismatch(field))
        }
        OptionKind::List => {
            let mut list = Vec::new();
            for occurrence in occurrences {
                list.extend(split_list(occurrence));
            }
            Ok(OptionValue::List(list))
        }
        OptionKind::Map => {
            let joined = occurrences.join(",");
            parse_map(field, &joined)
        }
    }
}

fn single_occurrence<'a>(field: &OptionField, occurrences: &[&'a str]) -> Result<&'a str> {
    match occurrences {
        [s] => Ok(s),
        _ => Err(type_mismatch(field)),
    }
}

/// Split a comma-delimited string into an ordered list.
///
/// `"a,b,c"` parses to the same sequence as the native list
/// `["a", "b", "c"]`. Empty segments are dropped, so the empty string
/// yields an empty list.
fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `k=v` comma/semicolon-delimited string into a map.
///
/// Duplicate keys deduplicate with the last occurrence winning.
fn parse_map(field: &OptionField, s: &str) -> Result<OptionValue> {
    let mut map = BTreeMap::new();
    for item in s.split([',', ';']) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (k, v) = item.split_once('=').ok_or_else(|| type_mismatch(field))?;
        map.insert(k.trim().to_string(), v.trim().to_string());
    }
    Ok(OptionValue::Map(map))
}
