//! Define error types for IR → source emission.
//!
//! These errors represent *emission* failures (as opposed to configuration or synthesis errors).

/// Error during IR emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The program has no package clause to emit.
    MissingPackage,
    Unsupported(String),
}

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitError::MissingPackage => write!(f, "program has no package name"),
            EmitError::Unsupported(msg) => write!(f, "unsupported: {}", msg),
        }
    }
}

impl std::error::Error for EmitError {}

impl miette::Diagnostic for EmitError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new("convgen::emit"))
    }
}
