// src/options/mod.rs

//! Build option schema and the per-invocation option set
//!
//! A recipe declares its options with a typed domain and a default. The
//! workflow builds one [`OptionSet`] per invocation: defaults first (with
//! platform-pruned options removed), then caller overrides validated
//! against the declared domains, then the configuration step's implication
//! rules, and finally a freeze before acquisition and build run. There is
//! no recipe-level mutable default state anywhere else.

use crate::error::{Error, Result};
use crate::platform::Os;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known option controlling the produced link mode
pub const OPT_SHARED: &str = "shared";

/// Well-known option requesting position-independent code
pub const OPT_FPIC: &str = "fPIC";

/// Tool variable carrying the derived static-build flag
pub const VAR_LIB_STATIC: &str = "LIB_STATIC";

/// Toggle telling the build tool to install static-library artifacts
pub const VAR_INSTALL_STATIC: &str = "INSTALL_STATIC_LIBRARY";

/// Allowed value domain for a declared option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDomain {
    /// `true` or `false`
    Bool,
    /// One of a fixed set of strings
    Enum(Vec<String>),
    /// Free-form string, passed through to the external build tool
    /// without any validation — the lack of checking is the contract.
    Any,
}

impl OptionDomain {
    /// Check a value against this domain
    pub fn check(&self, name: &str, value: &OptionValue) -> Result<()> {
        let ok = match (self, value) {
            (Self::Bool, OptionValue::Bool(_)) => true,
            (Self::Any, OptionValue::Str(_)) => true,
            (Self::Enum(allowed), OptionValue::Str(s)) => allowed.iter().any(|a| a == s),
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(Error::InvalidOption {
                name: name.to_string(),
                reason: format!("value `{value}` not allowed by domain {self}"),
            })
        }
    }
}

impl fmt::Display for OptionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Any => f.write_str("any"),
            Self::Enum(values) => write!(f, "one of [{}]", values.join(", ")),
        }
    }
}

impl<'de> Deserialize<'de> for OptionDomain {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Keyword(String),
            Values(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Keyword(word) => match word.as_str() {
                "bool" => Ok(OptionDomain::Bool),
                "any" => Ok(OptionDomain::Any),
                other => Err(serde::de::Error::custom(format!(
                    "unknown option domain `{other}` (expected \"bool\", \"any\", or a value list)"
                ))),
            },
            Repr::Values(values) => Ok(OptionDomain::Enum(values)),
        }
    }
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// One option declaration in a recipe manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OptionSpec {
    pub domain: OptionDomain,
    pub default: OptionValue,

    /// OSes on which this option does not exist; it is deleted before
    /// defaults are presented to the caller (e.g. fPIC on Windows).
    #[serde(default)]
    pub remove_on: Vec<Os>,

    /// Value fixed by the recipe; overrides are rejected.
    #[serde(default)]
    pub locked: bool,
}

/// The per-invocation option map
///
/// Iteration order is the option name order, so derived artifacts
/// (tool variables, identity hashes) are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    specs: BTreeMap<String, OptionSpec>,
    values: BTreeMap<String, OptionValue>,
    frozen: bool,
}

impl OptionSet {
    /// Build the initial set from a recipe's declarations for one target OS
    pub fn from_schema(schema: &BTreeMap<String, OptionSpec>, os: Os) -> Self {
        let mut values = BTreeMap::new();
        for (name, spec) in schema {
            if spec.remove_on.contains(&os) {
                continue;
            }
            values.insert(name.clone(), spec.default.clone());
        }

        Self {
            specs: schema.clone(),
            values,
            frozen: false,
        }
    }

    /// Override an option, validating against its declared domain
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<()> {
        if self.frozen {
            return Err(Error::InvalidOption {
                name: name.to_string(),
                reason: "option set is frozen".to_string(),
            });
        }

        let spec = self.specs.get(name).ok_or_else(|| Error::InvalidOption {
            name: name.to_string(),
            reason: "not declared by this recipe".to_string(),
        })?;

        if spec.locked {
            return Err(Error::InvalidOption {
                name: name.to_string(),
                reason: format!("fixed by the recipe to `{}`", spec.default),
            });
        }

        if !self.values.contains_key(name) {
            return Err(Error::InvalidOption {
                name: name.to_string(),
                reason: "not available on this platform".to_string(),
            });
        }

        spec.domain.check(name, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Override an option from its string form (CLI `-o name=value`)
    pub fn set_str(&mut self, name: &str, raw: &str) -> Result<()> {
        let spec = self.specs.get(name).ok_or_else(|| Error::InvalidOption {
            name: name.to_string(),
            reason: "not declared by this recipe".to_string(),
        })?;

        let value = match spec.domain {
            OptionDomain::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => OptionValue::Bool(true),
                "false" => OptionValue::Bool(false),
                _ => {
                    return Err(Error::InvalidOption {
                        name: name.to_string(),
                        reason: format!("expected true or false, got `{raw}`"),
                    });
                }
            },
            _ => OptionValue::Str(raw.to_string()),
        };

        self.set(name, value)
    }

    /// Remove an option entirely (implication rules, not "set false")
    ///
    /// Returns `None` once the set is frozen.
    pub fn remove(&mut self, name: &str) -> Option<OptionValue> {
        if self.frozen {
            return None;
        }
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(OptionValue::as_bool)
    }

    /// Whether the option is present in the current value map
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Freeze the set; acquisition and build read it, nothing mutates it
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
