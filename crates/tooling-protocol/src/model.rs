//! Model request types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies the model a client is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentifier {
    /// Fully qualified model name, e.g. `tooling.model.ProviderInfo`.
    pub name: String,
}

impl ModelIdentifier {
    /// Create a new model identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Operation parameters sent with a model request.
///
/// The dispatcher only looks at the option names; the values belong to the
/// producer that builds the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildParameters {
    /// Command-line style arguments (`--name` or `--name=value`).
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Structured options keyed by option name.
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

impl BuildParameters {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command-line style argument.
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Add a structured option.
    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Whether no arguments or options were supplied.
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty() && self.options.is_empty()
    }

    /// Every option named by these parameters, in order of first appearance.
    ///
    /// Arguments come first, then the keys of the options map.
    pub fn option_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let from_arguments = self.arguments.iter().filter_map(|a| split_argument(a).map(|(name, _)| name));
        for name in from_arguments.chain(self.options.keys().map(String::as_str)) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Look up an option value, preferring the options map over arguments.
    ///
    /// A bare `--name` argument reads as `true`.
    pub fn option(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.options.get(name) {
            return Some(value.clone());
        }
        self.arguments.iter().find_map(|argument| match split_argument(argument) {
            Some((n, Some(value))) if n == name => Some(Value::String(value.to_string())),
            Some((n, None)) if n == name => Some(Value::Bool(true)),
            _ => None,
        })
    }
}

/// Split `--name=value` into its name and optional value.
///
/// Only `--name` and `--name=value` name an option. Positional arguments,
/// single-dash flags and a bare `--` yield `None`.
fn split_argument(argument: &str) -> Option<(&str, Option<&str>)> {
    let rest = argument.strip_prefix("--")?;
    let (name, value) = match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };
    if name.is_empty() || name.starts_with('-') {
        return None;
    }
    Some((name, value))
}
