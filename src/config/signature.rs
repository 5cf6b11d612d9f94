//! Function signature validation.
//!
//! Two shapes are accepted:
//!
//! - `(source) target` or `(source) (target, error)`: value return
//! - `(source, *target)` or `(source, *target) error`: in-place population
//!
//! Extends may additionally take the converter interface as their first parameter, in which case
//! the generated code passes the converter itself.

use convgen_types::TypeArena;

use super::ConfigError;
use crate::synth::{Convention, DeclaredFunction};

/// Parse and validate a function signature.
///
/// `interface` is the converter interface name; when given, a leading parameter of that type is
/// stripped and marks the function as taking the converter.
pub fn parse_signature(
    types: &mut TypeArena,
    name: &str,
    params: &[String],
    results: &[String],
    interface: Option<&str>,
) -> Result<DeclaredFunction, ConfigError> {
    let mut params: Vec<&str> = params.iter().map(String::as_str).collect();
    let mut self_as_first_param = false;
    if let Some(interface) = interface {
        if params.len() >= 2 && names_interface(params[0], interface) {
            params.remove(0);
            self_as_first_param = true;
        }
    }

    let invalid = |message: String| ConfigError::Signature {
        function: name.to_string(),
        message,
    };
    let mut parse = |expr: &str| {
        types.parse(expr).map_err(|source| ConfigError::Type {
            context: format!("signature of {name}"),
            source,
        })
    };

    let (source, target, error, convention) = match (params.as_slice(), results) {
        ([source], [target]) => (parse(source)?, parse(target)?, None, Convention::ValueReturn),
        ([source], [target, error]) => (
            parse(source)?,
            parse(target)?,
            Some(parse(error)?),
            Convention::ValueReturn,
        ),
        ([source, target], []) => (parse(source)?, parse(target)?, None, Convention::OutParam),
        ([source, target], [error]) => (
            parse(source)?,
            parse(target)?,
            Some(parse(error)?),
            Convention::OutParam,
        ),
        _ => {
            return Err(invalid(format!(
                "expected `(source) target[, error]` or `(source, *target) [error]`, got {} parameter(s) and {} result(s)",
                params.len(),
                results.len()
            )));
        }
    };

    if let Some(error) = error {
        if !types.is_error(error) {
            return Err(invalid(format!(
                "the last result must be `error`, got `{}`",
                types.key(error)
            )));
        }
    }
    if convention == Convention::OutParam && !types.is_pointer(target) {
        return Err(invalid(format!(
            "the second parameter must be a pointer, got `{}`",
            types.key(target)
        )));
    }
    if types.is_error(target) {
        return Err(invalid("the target type cannot be `error`".to_string()));
    }

    Ok(DeclaredFunction {
        name: name.to_string(),
        source,
        target,
        convention,
        fallible: error.is_some(),
        self_as_first_param,
    })
}

/// `Converter` or `pkg.Converter`.
fn names_interface(param: &str, interface: &str) -> bool {
    param == interface
        || param
            .rsplit_once('.')
            .is_some_and(|(_, name)| name == interface)
}

// ============================================================================
// Tests
// ============================================================================
