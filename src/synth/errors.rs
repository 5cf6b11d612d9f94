//! Conversion errors with the path that led to them.
//!
//! A [`ConversionError`] is raised deep inside a nested build (a field of a list element of a struct,
//! say) and travels outward. Every rule that wraps a nested build prepends one [`PathHop`] on the
//! way out, so the final error reads from the method's parameters down to the failing pair.

use std::fmt;

/// One step of the source → target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHop {
    /// Source side accessor, e.g. `.CreatedAt`, `[]`, `*`. `???` when the source field is unknown.
    pub source: String,
    pub source_type: String,
    pub target: String,
    pub target_type: String,
}

impl PathHop {
    pub fn new(
        source: impl Into<String>,
        source_type: impl Into<String>,
        target: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_type: source_type.into(),
            target: target.into(),
            target_type: target_type.into(),
        }
    }
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum ErrorCause {
    #[error("TypeMismatch: cannot convert {from} to {to}")]
    #[diagnostic(
        code(convgen::type_mismatch),
        help("declare an extend function for this pair, or map the field from a compatible source")
    )]
    TypeMismatch { from: String, to: String },

    #[error("cannot match the target field {field:?} with the source type {source_type}: {detail}")]
    #[diagnostic(
        code(convgen::unresolved_field),
        help("map the field explicitly, ignore it, or enable no_strict to skip unmatched fields")
    )]
    UnresolvedField {
        field: String,
        source_type: String,
        detail: String,
    },

    #[error("cannot match the target field {field:?} with the source type {source_type}: {detail}")]
    #[diagnostic(
        code(convgen::ambiguous_field),
        help("define the mapping explicitly with `map` to pick one of the candidates")
    )]
    AmbiguousField {
        field: String,
        source_type: String,
        detail: String,
    },

    #[error("cannot set value for unexported field {field:?} of {target_type}")]
    #[diagnostic(
        code(convgen::unexported_field),
        help("ignore the field, or set ignore_unexported to skip unexported target fields")
    )]
    UnexportedField { field: String, target_type: String },

    #[error("cannot resolve mapping path {path:?} for target field {field:?}: segment {segment} ({name:?}) {reason}")]
    #[diagnostic(code(convgen::unresolved_path), help("every segment except the last must be a struct or a pointer to one"))]
    UnresolvedPath {
        field: String,
        path: String,
        segment: usize,
        name: String,
        reason: String,
    },

    #[error(
        "ReturnTypeMismatch: cannot call {callee} from {method}: {callee} can fail (because of {origin}) but {method} does not return an error"
    )]
    #[diagnostic(
        code(convgen::return_type_mismatch),
        help("add `error` as the last result of the declared method")
    )]
    ReturnTypeMismatch {
        callee: String,
        method: String,
        origin: String,
    },
}

/// A failed conversion together with the path from the method's parameters to the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub cause: ErrorCause,
    pub path: Vec<PathHop>,
}

impl ConversionError {
    pub fn new(cause: ErrorCause) -> Self {
        Self { cause, path: Vec::new() }
    }

    pub fn type_mismatch(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(ErrorCause::TypeMismatch {
            from: from.into(),
            to: to.into(),
        })
    }

    /// Prepend the hop through which the error surfaced.
    pub fn lift(mut self, hop: PathHop) -> Self {
        self.path.insert(0, hop);
        self
    }

    /// Whether lenient mode may skip the offending field instead of failing.
    pub fn is_skippable(&self) -> bool {
        matches!(self.cause, ErrorCause::UnresolvedField { .. })
    }
}

impl From<ErrorCause> for ConversionError {
    fn from(cause: ErrorCause) -> Self {
        Self::new(cause)
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            let width = self
                .path
                .iter()
                .map(|hop| hop.source.len() + hop.source_type.len())
                .max()
                .unwrap_or(0)
                + 3;
            for hop in &self.path {
                let source = format!("{} ({})", hop.source, hop.source_type);
                writeln!(f, "| {:<width$} -> {} ({})", source, hop.target, hop.target_type)?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", self.cause)
    }
}

// The cause is part of the message, so it is not reported again as a source.
impl std::error::Error for ConversionError {}

impl miette::Diagnostic for ConversionError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.cause.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.cause.help()
    }
}

/// A conversion error attributed to the method whose body failed to build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error while creating converter method {method}:\n\n{error}")]
pub struct MethodError {
    pub method: String,
    pub error: ConversionError,
}

impl miette::Diagnostic for MethodError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.error.code()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.error.help()
    }
}

/// Two declared methods convert the same pair with the same convention.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("methods {first} and {second} have the same signature")]
pub struct DuplicateSignature {
    pub first: String,
    pub second: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lift_prepends_hops() {
        let err = ConversionError::type_mismatch("string", "int")
            .lift(PathHop::new(".Name", "string", ".Name", "int"))
            .lift(PathHop::new("source", "*app.A", "target", "*app.B"));
        assert_eq!(err.path.len(), 2);
        assert_eq!(err.path[0].source, "source");
        assert_eq!(err.path[1].target, ".Name");
    }

    #[test]
    fn test_display_lists_path_then_cause() {
        let err = ConversionError::type_mismatch("string", "int")
            .lift(PathHop::new(".Name", "string", ".Name", "int"))
            .lift(PathHop::new("source", "app.A", "target", "app.B"));
        let text = err.to_string();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("| source (app.A)"));
        assert!(lines[0].ends_with("-> target (app.B)"));
        assert!(lines[1].starts_with("| .Name (string)"));
        assert_eq!(lines[3], "TypeMismatch: cannot convert string to int");
    }

    #[test]
    fn test_only_unresolved_fields_are_skippable() {
        let unresolved = ConversionError::new(ErrorCause::UnresolvedField {
            field: "Name".to_string(),
            source_type: "app.A".to_string(),
            detail: "\"Name\" does not exist".to_string(),
        });
        assert!(unresolved.is_skippable());
        let ambiguous = ConversionError::new(ErrorCause::AmbiguousField {
            field: "Id".to_string(),
            source_type: "app.A".to_string(),
            detail: String::new(),
        });
        assert!(!ambiguous.is_skippable());
    }
}
