//! Validation policy declarations and their resolution.
//!
//! A [`Config`] is what a model or wrapped function declares; a [`Policy`] is
//! what the enforcer applies after merging the declarations of every ancestor
//! with the local one.
//!
//! Declarations may come from Rust, a plain mapping, or a TOML/JSON document:
//!
//! ```rust
//! use polyforce_core::{Config, ConcreteType, Policy};
//!
//! let from_toml = Config::from_toml_str(r#"ignored_types = ["Actor"]"#).unwrap();
//! let from_rust = Config::new().ignored_types(["Actor"]);
//! assert_eq!(from_toml, from_rust);
//!
//! let policy = Policy::from_config(&from_rust);
//! assert!(policy.is_exempt(&ConcreteType::class("Actor")));
//! assert!(!policy.bypass());
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::value::ConcreteType;

/// A validation policy declaration.
///
/// Unset keys inherit from ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Disables type enforcement when `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,

    /// Types that always pass the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_types: Option<Vec<ConcreteType>>,
}

impl Config {
    /// An empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bypass flag.
    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Adds exempt types.
    pub fn ignored_types<T>(mut self, types: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<ConcreteType>,
    {
        self.ignored_types
            .get_or_insert_with(Vec::new)
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Parses a plain mapping with the keys `ignore` and `ignored_types`.
    pub fn from_mapping(mapping: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(mapping)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.toml` or `.json` file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }

    /// Rejects empty type names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(types) = &self.ignored_types {
            if types.iter().any(|ty| ty.name().trim().is_empty()) {
                return Err(ConfigError::invalid_value(
                    "ignored_types",
                    "type names must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Overlays `other` onto this declaration: set scalars replace, type
    /// lists extend.
    pub fn overlay(&mut self, other: &Self) {
        if let Some(ignore) = other.ignore {
            self.ignore = Some(ignore);
        }
        if let Some(types) = &other.ignored_types {
            let merged = self.ignored_types.get_or_insert_with(Vec::new);
            for ty in types {
                if !merged.contains(ty) {
                    merged.push(ty.clone());
                }
            }
        }
    }

    /// Merges ancestor declarations (most-base first) and then `local`.
    pub fn merged<'a>(
        ancestors: impl IntoIterator<Item = &'a Config>,
        local: Option<&Config>,
    ) -> Self {
        let mut merged = Self::new();
        for ancestor in ancestors {
            merged.overlay(ancestor);
        }
        if let Some(local) = local {
            merged.overlay(local);
        }
        merged
    }
}

impl TryFrom<serde_json::Value> for Config {
    type Error = ConfigError;

    fn try_from(mapping: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_mapping(mapping)
    }
}

/// The effective validation policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Policy {
    bypass: bool,
    exempt_types: IndexSet<ConcreteType>,
}

impl Policy {
    /// Full enforcement, nothing exempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a merged declaration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            bypass: config.ignore.unwrap_or(false),
            exempt_types: config
                .ignored_types
                .iter()
                .flatten()
                .cloned()
                .collect(),
        }
    }

    /// Resolves the policy of a scope whose ancestors declared `ancestors`
    /// (most-base first) and which itself declares `local`.
    pub fn resolve<'a>(
        ancestors: impl IntoIterator<Item = &'a Config>,
        local: Option<&Config>,
    ) -> Self {
        Self::from_config(&Config::merged(ancestors, local))
    }

    /// Returns `true` if type enforcement is disabled.
    pub const fn bypass(&self) -> bool {
        self.bypass
    }

    /// Returns the exempt types.
    pub fn exempt_types(&self) -> &IndexSet<ConcreteType> {
        &self.exempt_types
    }

    /// Returns `true` if values of `ty` always pass.
    pub fn is_exempt(&self, ty: &ConcreteType) -> bool {
        self.exempt_types.contains(ty)
    }
}
