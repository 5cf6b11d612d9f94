//! Type references carried by IR nodes.

use std::fmt;

use serde::Serialize;

/// Canonical spelling of a type as it appears in emitted code, e.g. `*app.User`.
///
/// The IR does not own type descriptors; emitters only need the spelling. Package qualifiers are
/// kept and stripped by the emitter for the output package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(spelling: impl Into<String>) -> Self {
        Self(spelling.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
