// src/recipe/configure.rs

//! Option implication rules and the effective tool configuration
//!
//! Configuration is a pure transformation from the validated option set to
//! the variable map handed to the external build tool. The rules run in a
//! fixed order:
//!
//! 1. a shared build implies position-independent code, so `fPIC` is
//!    removed entirely (not set false);
//! 2. every remaining declared option is forwarded verbatim, keyed by its
//!    option name — no option is silently dropped;
//! 3. the derived `LIB_STATIC` variable carries the negation of `shared`;
//! 4. `INSTALL_STATIC_LIBRARY` mirrors `LIB_STATIC` unless the recipe
//!    declares it as a caller-settable option, in which case the declared
//!    value was already forwarded in step 2.
//!
//! Compiler dialect settings (`cppstd`, `libcxx`) never appear here; the
//! workflow clears them before this step because a C ABI boundary ignores
//! them.

use crate::options::{OptionSet, OptionValue, OPT_FPIC, OPT_SHARED, VAR_INSTALL_STATIC, VAR_LIB_STATIC};
use std::collections::BTreeMap;

/// Effective variable map passed to the external build tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolConfig {
    variables: BTreeMap<String, String>,
}

impl ToolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Render as `-DKEY=VALUE` command-line arguments
    pub fn define_args(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|(k, v)| format!("-D{k}={v}"))
            .collect()
    }
}

/// Apply the inter-option implication rules
pub(crate) fn apply_implications(options: &mut OptionSet) {
    if options.get_bool(OPT_SHARED) == Some(true) {
        options.remove(OPT_FPIC);
    }
}

/// Produce the effective tool configuration from a configured option set
pub(crate) fn generate(options: &OptionSet) -> ToolConfig {
    let mut config = ToolConfig::new();

    for (name, value) in options.iter() {
        config.set(name, tool_value(value));
    }

    let static_build = !options.get_bool(OPT_SHARED).unwrap_or(false);
    config.set(VAR_LIB_STATIC, bool_value(static_build));

    if !options.contains(VAR_INSTALL_STATIC) {
        config.set(VAR_INSTALL_STATIC, bool_value(static_build));
    }

    config
}

fn tool_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => bool_value(*b).to_string(),
        OptionValue::Str(s) => s.clone(),
    }
}

fn bool_value(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}
