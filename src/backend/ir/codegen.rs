//! Manifest → IR generation facade
//!
//! This module provides `Generator`, the single entrypoint that turns a [`Manifest`] into an
//! [`IrProgram`]:
//!
//! ```text
//! Manifest → declare types → parse signatures/extends → Engine::create_methods → IrProgram
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use convgen::backend::ir::{Generator, TextEmitter};
//!
//! let manifest = Manifest::from_json(json)?;
//! let program = Generator::new(&manifest).generate()?;
//! let text = Generator::new(&manifest).render(&TextEmitter::new())?;
//! ```
//!
//! ## Error Handling
//!
//! Configuration problems are reported before any method body is built. Conversion errors name the
//! converter method whose body failed and carry the path down to the failing pair.

use std::collections::HashSet;
use std::rc::Rc;

use convgen_types::TypeArena;

use super::{CodeEmitter, EmitError, IrConverter, IrProgram};
use crate::config::{self, ConfigError, ConverterDecl, Manifest};
use crate::synth::{Engine, MethodError};

/// Error while generating converters.
#[derive(Debug)]
pub enum GenerationError {
    /// The manifest is invalid
    Config(ConfigError),
    /// A method body could not be synthesized
    Conversion(MethodError),
    /// The IR could not be rendered
    Emission(EmitError),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::Config(e) => write!(f, "{}", e),
            GenerationError::Conversion(e) => write!(f, "{}", e),
            GenerationError::Emission(e) => write!(f, "{}", e),
        }
    }
}

// Transparent over the wrapped error.
impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Config(e) => std::error::Error::source(e),
            GenerationError::Conversion(e) => std::error::Error::source(e),
            GenerationError::Emission(e) => std::error::Error::source(e),
        }
    }
}

impl miette::Diagnostic for GenerationError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            GenerationError::Config(e) => e.code(),
            GenerationError::Conversion(e) => e.code(),
            GenerationError::Emission(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        match self {
            GenerationError::Config(e) => e.help(),
            GenerationError::Conversion(e) => e.help(),
            GenerationError::Emission(e) => e.help(),
        }
    }
}

impl From<ConfigError> for GenerationError {
    fn from(e: ConfigError) -> Self {
        GenerationError::Config(e)
    }
}

impl From<MethodError> for GenerationError {
    fn from(e: MethodError) -> Self {
        GenerationError::Conversion(e)
    }
}

impl From<EmitError> for GenerationError {
    fn from(e: EmitError) -> Self {
        GenerationError::Emission(e)
    }
}

/// Converter generator for one manifest.
pub struct Generator<'a> {
    manifest: &'a Manifest,
}

impl<'a> Generator<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self { manifest }
    }

    /// Synthesize every converter of the manifest.
    ///
    /// Converters are independent: each gets its own copy of the declared types, its own extend
    /// tables and its own method registry. They are returned ordered by implementation name.
    #[tracing::instrument(skip_all, fields(package = %self.manifest.package, converters = self.manifest.converters.len()))]
    pub fn generate(&self) -> Result<IrProgram, GenerationError> {
        let types = config::declare_types(self.manifest)?;

        let mut decls: Vec<&ConverterDecl> = self.manifest.converters.iter().collect();
        decls.sort_by_key(|decl| decl.impl_name());

        let mut converters = Vec::with_capacity(decls.len());
        for decl in decls {
            converters.push(self.generate_converter(&types, decl)?);
        }
        Ok(IrProgram {
            package: self.manifest.package.clone(),
            converters,
        })
    }

    /// Generate and render with `emitter`.
    pub fn render(&self, emitter: &dyn CodeEmitter) -> Result<String, GenerationError> {
        let program = self.generate()?;
        Ok(emitter.emit_program(&program)?)
    }

    fn generate_converter(&self, base: &TypeArena, decl: &ConverterDecl) -> Result<IrConverter, GenerationError> {
        let mut types = base.clone();
        let impl_name = decl.impl_name();
        let global_extends = Rc::new(config::extend_table(
            &mut types,
            self.manifest.extends.iter().chain(&decl.extends),
            &decl.name,
        )?);

        let mut seen = HashSet::new();
        let mut declared = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            if !seen.insert(method.name.as_str()) {
                return Err(ConfigError::DuplicateMethod {
                    converter: decl.name.clone(),
                    name: method.name.clone(),
                }
                .into());
            }
            let signature = config::parse_signature(&mut types, &method.name, &method.params, &method.results, None)?;
            let method_extends = Rc::new(config::extend_table(&mut types, &method.extends, &decl.name)?);
            let policy = config::method_policy(decl, method, method_extends, Rc::clone(&global_extends));
            declared.push((signature, policy));
        }

        let mut engine = Engine::new(types, impl_name.clone());
        for (signature, policy) in declared {
            engine
                .register_explicit(&decl.name, signature, policy)
                .map_err(|source| ConfigError::DuplicateSignature {
                    converter: decl.name.clone(),
                    source,
                })?;
        }
        let methods = engine.create_methods()?;
        tracing::debug!(converter = %decl.name, methods = methods.len(), "converter generated");

        Ok(IrConverter {
            interface: decl.name.clone(),
            name: impl_name,
            methods,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ir::TextEmitter;

    fn manifest(json: &str) -> Manifest {
        Manifest::from_json(json).unwrap()
    }

    #[test]
    fn test_converters_sorted_by_impl_name() {
        let m = manifest(
            r#"{
                "package": "app",
                "types": { "app.A": "struct { X int }" },
                "converters": [
                    { "name": "Second", "methods": [{ "name": "Copy", "params": ["app.A"], "results": ["app.A"] }] },
                    { "name": "First", "methods": [{ "name": "Copy", "params": ["app.A"], "results": ["app.A"] }] }
                ]
            }"#,
        );
        let program = Generator::new(&m).generate().unwrap();
        let names: Vec<_> = program.converters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["FirstImpl", "SecondImpl"]);
    }

    #[test]
    fn test_duplicate_method_name() {
        let m = manifest(
            r#"{
                "package": "app",
                "converters": [{ "name": "Converter", "methods": [
                    { "name": "Copy", "params": ["int"], "results": ["int"] },
                    { "name": "Copy", "params": ["string"], "results": ["string"] }
                ] }]
            }"#,
        );
        let err = Generator::new(&m).generate().unwrap_err();
        assert!(matches!(err, GenerationError::Config(ConfigError::DuplicateMethod { .. })), "{err}");
    }

    #[test]
    fn test_duplicate_signature() {
        let m = manifest(
            r#"{
                "package": "app",
                "converters": [{ "name": "Converter", "methods": [
                    { "name": "One", "params": ["int"], "results": ["int64"] },
                    { "name": "Two", "params": ["int"], "results": ["int64"] }
                ] }]
            }"#,
        );
        let err = Generator::new(&m).generate().unwrap_err();
        let GenerationError::Config(ConfigError::DuplicateSignature { source, .. }) = err else {
            panic!("expected duplicate signature, got {err}");
        };
        assert_eq!(source.first, "Converter.One");
        assert_eq!(source.second, "Converter.Two");
    }

    #[test]
    fn test_render_requires_package() {
        let m = manifest(r#"{ "converters": [] }"#);
        let err = Generator::new(&m).render(&TextEmitter::new()).unwrap_err();
        assert!(matches!(err, GenerationError::Emission(EmitError::MissingPackage)));
    }
}
