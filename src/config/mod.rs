//! Configuration: the manifest format and its translation into synthesis inputs.
//!
//! Everything here runs before synthesis. Any problem (malformed JSON, an unknown type, a method
//! with an unsupported signature) is a [`ConfigError`] and stops generation before a single body
//! is built.

pub mod manifest;
pub mod signature;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use convgen_types::{TypeArena, TypeError};

pub use manifest::{ConverterDecl, FunctionDecl, Manifest, MethodDecl};
pub use signature::parse_signature;

use crate::synth::{DuplicateSignature, ExtendTable, MethodPolicy};

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    #[diagnostic(code(convgen::config::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest")]
    #[diagnostic(code(convgen::config::manifest))]
    Manifest(#[from] serde_json::Error),

    #[error("invalid type in {context}")]
    #[diagnostic(
        code(convgen::config::type_expression),
        help("types are written like `int64`, `*pkg.Name`, `[]T`, `map[K]V` or `struct {{ Name T }}`")
    )]
    Type {
        context: String,
        #[source]
        source: TypeError,
    },

    #[error("invalid signature for {function}: {message}")]
    #[diagnostic(
        code(convgen::config::signature),
        help("declare either `(source) target[, error]` or `(source, *target) [error]`")
    )]
    Signature { function: String, message: String },

    #[error("converter {converter} declares method {name} more than once")]
    #[diagnostic(code(convgen::config::duplicate_method))]
    DuplicateMethod { converter: String, name: String },

    #[error("duplicate signature in converter {converter}")]
    #[diagnostic(
        code(convgen::config::duplicate_signature),
        help("declare each source/target pair at most once per converter")
    )]
    DuplicateSignature {
        converter: String,
        #[source]
        source: DuplicateSignature,
    },
}

/// Declare every named type of the manifest in a fresh arena.
pub fn declare_types(manifest: &Manifest) -> Result<TypeArena, ConfigError> {
    let mut types = TypeArena::new();
    for (name, expr) in &manifest.types {
        types.declare_str(name.clone(), expr).map_err(|source| ConfigError::Type {
            context: format!("declaration of {name}"),
            source,
        })?;
    }
    // classify eagerly so broken declarations fail here and not at first use
    for name in types.declared_names() {
        types.parse(&name).map_err(|source| ConfigError::Type {
            context: format!("declaration of {name}"),
            source,
        })?;
    }
    Ok(types)
}

/// Parse extend declarations into a table. Later declarations override earlier ones.
pub fn extend_table<'a>(
    types: &mut TypeArena,
    decls: impl IntoIterator<Item = &'a FunctionDecl>,
    interface: &str,
) -> Result<ExtendTable, ConfigError> {
    let mut table = ExtendTable::new();
    for decl in decls {
        let parsed = parse_signature(types, &decl.name, &decl.params, &decl.results, Some(interface))?;
        if let Some(previous) = table.insert(parsed.into_extend()) {
            tracing::debug!(extend = %decl.name, replaced = %previous.id, "extend overrides an earlier declaration");
        }
    }
    Ok(table)
}

/// Resolve the settings a declared method is built with.
///
/// Strictness and unexported-field handling combine the converter and method flags; a method can
/// turn a converter-wide relaxation back off with `strict` or `unexported`.
pub fn method_policy(
    converter: &ConverterDecl,
    method: &MethodDecl,
    method_extends: Rc<ExtendTable>,
    global_extends: Rc<ExtendTable>,
) -> MethodPolicy {
    MethodPolicy {
        converter: converter.name.clone(),
        method: method.name.clone(),
        scope_target: None,
        field_map: method
            .map
            .iter()
            .map(|(target, source)| (target.clone(), source.clone()))
            .collect::<HashMap<_, _>>(),
        ignored: method.ignore.iter().cloned().collect::<HashSet<_>>(),
        identity: method.identity.iter().cloned().collect::<HashSet<_>>(),
        case_insensitive: method.match_ignore_case,
        lenient: (converter.no_strict || method.no_strict) && !method.strict,
        silent_unexported: (converter.ignore_unexported || method.ignore_unexported) && !method.unexported,
        tag_search: converter.tag_search.clone(),
        method_extends,
        global_extends,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(no_strict: bool, ignore_unexported: bool) -> ConverterDecl {
        ConverterDecl {
            name: "Converter".to_string(),
            no_strict,
            ignore_unexported,
            ..ConverterDecl::default()
        }
    }

    fn policy(converter: &ConverterDecl, method: &MethodDecl) -> MethodPolicy {
        method_policy(converter, method, Rc::default(), Rc::default())
    }

    #[test]
    fn test_method_can_relax_strictness() {
        let method = MethodDecl {
            no_strict: true,
            ..MethodDecl::default()
        };
        assert!(policy(&converter(false, false), &method).lenient);
        assert!(!policy(&converter(false, false), &MethodDecl::default()).lenient);
    }

    #[test]
    fn test_method_strict_overrides_converter() {
        let method = MethodDecl {
            strict: true,
            ..MethodDecl::default()
        };
        assert!(policy(&converter(true, false), &MethodDecl::default()).lenient);
        assert!(!policy(&converter(true, false), &method).lenient);
    }

    #[test]
    fn test_unexported_handling() {
        let reenabled = MethodDecl {
            unexported: true,
            ..MethodDecl::default()
        };
        assert!(policy(&converter(false, true), &MethodDecl::default()).silent_unexported);
        assert!(!policy(&converter(false, true), &reenabled).silent_unexported);
    }

    #[test]
    fn test_later_extend_overrides_earlier() {
        let mut types = TypeArena::new();
        let decls = [
            FunctionDecl {
                name: "conv.First".to_string(),
                params: vec!["string".to_string()],
                results: vec!["int".to_string()],
            },
            FunctionDecl {
                name: "conv.Second".to_string(),
                params: vec!["string".to_string()],
                results: vec!["int".to_string(), "error".to_string()],
            },
        ];
        let table = extend_table(&mut types, &decls, "Converter").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_broken_declaration_is_reported() {
        let manifest = Manifest::from_json(r#"{ "types": { "app.A": "struct { X app.Missing }" } }"#).unwrap();
        let err = declare_types(&manifest).unwrap_err();
        assert!(err.to_string().contains("app.A"), "{err}");
    }

    #[test]
    fn test_type_error_help_shows_struct_syntax() {
        use miette::Diagnostic;

        let manifest = Manifest::from_json(r#"{ "types": { "app.A": "map[" } }"#).unwrap();
        let err = declare_types(&manifest).unwrap_err();
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("`struct { Name T }`"), "{help}");
    }
}
