//! The JSON manifest describing types, extends and converters.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// A parsed converter manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Package the generated code lives in. Types of this package are spelled unqualified.
    pub package: String,
    /// Named type declarations: qualified name → underlying type expression.
    pub types: BTreeMap<String, String>,
    /// Extends available to every converter.
    pub extends: Vec<FunctionDecl>,
    pub converters: Vec<ConverterDecl>,
}

/// A converter interface and its implementation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterDecl {
    pub name: String,
    /// Name of the generated implementation type; `<name>Impl` when absent.
    #[serde(rename = "impl")]
    pub impl_name: Option<String>,
    pub no_strict: bool,
    pub ignore_unexported: bool,
    /// Tag keys consulted, in order, when matching fields by tag.
    pub tag_search: Vec<String>,
    pub extends: Vec<FunctionDecl>,
    pub methods: Vec<MethodDecl>,
}

impl ConverterDecl {
    pub fn impl_name(&self) -> String {
        self.impl_name.clone().unwrap_or_else(|| format!("{}Impl", self.name))
    }
}

/// A declared converter method with its field-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<String>,
    pub results: Vec<String>,
    /// target field → dotted source path
    pub map: BTreeMap<String, String>,
    pub ignore: Vec<String>,
    /// Target fields populated from the whole source value.
    pub identity: Vec<String>,
    pub match_ignore_case: bool,
    pub no_strict: bool,
    /// Re-enable strict matching when the converter sets `no_strict`.
    pub strict: bool,
    pub ignore_unexported: bool,
    /// Re-enable unexported field reporting when the converter sets `ignore_unexported`.
    pub unexported: bool,
    pub extends: Vec<FunctionDecl>,
}

/// A function signature: a user extend, or the shape of a method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionDecl {
    /// Qualified function name, e.g. `conv.ParseId`.
    pub name: String,
    pub params: Vec<String>,
    pub results: Vec<String>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Manifest, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Manifest, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
