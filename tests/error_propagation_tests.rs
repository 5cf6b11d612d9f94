//! Error reporting and fallibility propagation across synthesized methods.

use convgen::backend::ir::{GenerationError, Generator, IrProgram, TextEmitter};
use convgen::synth::{ConversionError, ErrorCause, MethodError};
use convgen::{ConfigError, Manifest};

fn generate(json: &str) -> Result<IrProgram, GenerationError> {
    let manifest = Manifest::from_json(json).expect("manifest failed to parse");
    Generator::new(&manifest).generate()
}

fn render(json: &str) -> String {
    let manifest = Manifest::from_json(json).expect("manifest failed to parse");
    Generator::new(&manifest)
        .render(&TextEmitter::new().without_header())
        .expect("generation failed")
}

fn conversion_error(json: &str) -> MethodError {
    match generate(json) {
        Err(GenerationError::Conversion(err)) => err,
        Err(other) => panic!("expected a conversion error, got: {other}"),
        Ok(program) => panic!("expected a conversion error, got: {program:?}"),
    }
}

fn hops(err: &ConversionError) -> Vec<(&str, &str)> {
    err.path
        .iter()
        .map(|hop| (hop.source.as_str(), hop.target.as_str()))
        .collect()
}

/// A converter with one method over `types`, with `method` merged into the method declaration.
fn single_method(types: &str, params: &str, results: &str, method: &str, extends: &str) -> String {
    format!(
        r#"{{
            "package": "app",
            "types": {{ {types} }},
            "extends": [{extends}],
            "converters": [{{
                "name": "Converter",
                "methods": [{{ "name": "Convert", "params": [{params}], "results": [{results}] {method} }}]
            }}]
        }}"#
    )
}

const PARSE_ID: &str = r#"{ "name": "app.ParseID", "params": ["string"], "results": ["int64", "error"] }"#;

const NESTED_TYPES: &str = r#"
    "app.X": "struct { Id string }",
    "app.Y": "struct { Id int64 }",
    "app.A": "struct { Inner app.X }",
    "app.B": "struct { Inner app.Y }"
"#;

// ============================================================================
// Fallibility
// ============================================================================

#[test]
fn test_fallibility_reaches_every_caller() {
    let output = render(&single_method(NESTED_TYPES, r#""app.A""#, r#""app.B", "error""#, "", PARSE_ID));

    assert!(output.contains("func (c *ConverterImpl) appXIntoAppY(in *X, out *Y) error {"), "{output}");
    assert!(output.contains("func (c *ConverterImpl) appAIntoAppB(in *A, out *B) error {"), "{output}");
    assert!(output.contains("\terr := c.appXIntoAppY(&in.Inner, &out.Inner)\n\tif err != nil {\n\t\treturn err\n\t}\n"), "{output}");
    assert!(output.contains("\terr := c.appAIntoAppB(&in, &appB)\n"), "{output}");
    assert!(output.contains("\t\tvar errValue B\n\t\treturn errValue, err\n"), "{output}");
    assert!(output.contains("\treturn appB, nil\n"), "{output}");
}

#[test]
fn test_infallible_declared_method_cannot_call_fallible_helper() {
    let err = conversion_error(&single_method(NESTED_TYPES, r#""app.A""#, r#""app.B""#, "", PARSE_ID));

    assert_eq!(err.method, "Converter.Convert");
    assert_eq!(
        err.error.cause,
        ErrorCause::ReturnTypeMismatch {
            callee: "ConverterImpl.appAIntoAppB".to_string(),
            method: "Converter.Convert".to_string(),
            origin: "app.ParseID".to_string(),
        }
    );
    let message = err.to_string();
    assert!(message.contains("ReturnTypeMismatch"), "{message}");
    assert!(message.contains("because of app.ParseID"), "{message}");
}

#[test]
fn test_fallible_in_place_method_returns_nil_on_success() {
    let output = render(&single_method(
        r#""app.A": "struct { Id string }", "app.B": "struct { Id int64 }""#,
        r#""*app.A", "*app.B""#,
        r#""error""#,
        "",
        PARSE_ID,
    ));
    assert!(output.contains("func (c *ConverterImpl) Convert(in *A, out *B) error {"), "{output}");
    assert!(output.contains("\tif in == nil || out == nil {\n\t\treturn nil\n\t}\n"), "{output}");
    assert!(output.ends_with("\tout.Id = xint64\n\treturn nil\n}\n"), "{output}");
}

// ============================================================================
// Paths
// ============================================================================

#[test]
fn test_type_mismatch_reports_full_path() {
    let err = conversion_error(&single_method(
        r#"
            "app.P": "struct { Name string }",
            "app.Q": "struct { Name int64 }",
            "app.A": "struct { Profile app.P }",
            "app.B": "struct { Profile app.Q }"
        "#,
        r#""app.A""#,
        r#""app.B""#,
        "",
        "",
    ));

    assert_eq!(
        err.error.cause,
        ErrorCause::TypeMismatch {
            from: "string".to_string(),
            to: "int64".to_string(),
        }
    );
    assert_eq!(
        hops(&err.error),
        vec![("source", "target"), (".Profile", ".Profile"), (".Name", ".Name")]
    );
    assert_eq!(err.error.path[0].source_type, "app.A");
    assert_eq!(err.error.path[2].target_type, "int64");

    let message = err.to_string();
    assert!(message.starts_with("error while creating converter method Converter.Convert:"), "{message}");
    assert!(message.contains("-> .Name (int64)"), "{message}");
    assert!(message.ends_with("TypeMismatch: cannot convert string to int64"), "{message}");
}

#[test]
fn test_unresolved_path_segment() {
    let err = conversion_error(&single_method(
        r#"
            "app.P": "struct { Nick string }",
            "app.A": "struct { Profile *app.P }",
            "app.B": "struct { Name string }"
        "#,
        r#""app.A""#,
        r#""app.B""#,
        r#", "map": { "Name": "Profile.Missing" }, "no_strict": true"#,
        "",
    ));
    let ErrorCause::UnresolvedPath {
        field,
        path,
        segment,
        name,
        ..
    } = &err.error.cause
    else {
        panic!("expected an unresolved path, got {:?}", err.error.cause);
    };
    assert_eq!((field.as_str(), path.as_str()), ("Name", "Profile.Missing"));
    assert_eq!((*segment, name.as_str()), (2, "Missing"));
}

#[test]
fn test_path_through_non_struct() {
    let err = conversion_error(&single_method(
        r#""app.A": "struct { Nick string }", "app.B": "struct { Name string }""#,
        r#""app.A""#,
        r#""app.B""#,
        r#", "map": { "Name": "Nick.Len" }"#,
        "",
    ));
    assert!(
        matches!(&err.error.cause, ErrorCause::UnresolvedPath { segment: 2, reason, .. } if reason.contains("non-struct type string")),
        "{err}"
    );
}

// ============================================================================
// Strictness
// ============================================================================

const EXTRA_TARGET_FIELD: &str = r#""app.A": "struct { Name string }", "app.B": "struct { Name string; Extra string }""#;

#[test]
fn test_unmatched_target_field_is_an_error() {
    let err = conversion_error(&single_method(EXTRA_TARGET_FIELD, r#""app.A""#, r#""app.B""#, "", ""));
    assert!(matches!(&err.error.cause, ErrorCause::UnresolvedField { field, .. } if field == "Extra"), "{err}");
    assert_eq!(hops(&err.error)[1], ("???", ".Extra"));
    assert_eq!(err.error.path[1].source_type, "*app.A");
}

#[test]
fn test_lenient_method_skips_unmatched_field() {
    let output = render(&single_method(
        EXTRA_TARGET_FIELD,
        r#""app.A""#,
        r#""app.B""#,
        r#", "no_strict": true"#,
        "",
    ));
    assert!(output.contains("out.Name = in.Name"), "{output}");
    assert!(!output.contains("Extra"), "{output}");
}

#[test]
fn test_method_strict_overrides_lenient_converter() {
    let json = format!(
        r#"{{
            "package": "app",
            "types": {{ {EXTRA_TARGET_FIELD} }},
            "converters": [{{
                "name": "Converter",
                "no_strict": true,
                "methods": [
                    {{ "name": "Loose", "params": ["app.A"], "results": ["app.B"] }},
                    {{ "name": "Strict", "params": ["*app.A", "*app.B"], "results": [], "strict": true }}
                ]
            }}]
        }}"#
    );
    let err = conversion_error(&json);
    assert_eq!(err.method, "Converter.Strict");
    assert!(matches!(err.error.cause, ErrorCause::UnresolvedField { .. }), "{err}");
}

#[test]
fn test_ambiguous_field_is_never_skipped() {
    let err = conversion_error(&single_method(
        r#""app.A": "struct { NAME string; NaMe string }", "app.B": "struct { Name string }""#,
        r#""app.A""#,
        r#""app.B""#,
        r#", "match_ignore_case": true, "no_strict": true"#,
        "",
    ));
    let ErrorCause::AmbiguousField { field, detail, .. } = &err.error.cause else {
        panic!("expected an ambiguous field, got {:?}", err.error.cause);
    };
    assert_eq!(field, "Name");
    assert!(detail.contains("NAME, NaMe"), "{detail}");
}

// ============================================================================
// Unexported target fields
// ============================================================================

const UNEXPORTED_TARGET_FIELD: &str = r#""app.A": "struct { Name string }", "app.B": "struct { Name string; secret string }""#;

#[test]
fn test_unexported_target_field_is_an_error() {
    let err = conversion_error(&single_method(UNEXPORTED_TARGET_FIELD, r#""app.A""#, r#""app.B""#, "", ""));
    assert_eq!(
        err.error.cause,
        ErrorCause::UnexportedField {
            field: "secret".to_string(),
            target_type: "app.B".to_string(),
        }
    );
}

#[test]
fn test_unexported_target_field_skipped() {
    for flags in [r#", "ignore_unexported": true"#, r#", "no_strict": true"#] {
        let output = render(&single_method(
            UNEXPORTED_TARGET_FIELD,
            r#""app.A""#,
            r#""app.B""#,
            flags,
            "",
        ));
        assert!(!output.contains("secret"), "{flags}: {output}");
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_out_parameter_must_be_a_pointer() {
    let err = generate(&single_method(
        r#""app.A": "struct { Name string }", "app.B": "struct { Name string }""#,
        r#""app.A", "app.B""#,
        "",
        "",
        "",
    ))
    .unwrap_err();
    assert!(
        matches!(err, GenerationError::Config(ConfigError::Signature { ref function, .. }) if function == "Convert"),
        "{err}"
    );
}

#[test]
fn test_unknown_type_in_signature() {
    let err = generate(&single_method(r#""app.A": "struct { Name string }""#, r#""app.A""#, r#""app.Nope""#, "", "")).unwrap_err();
    assert!(matches!(err, GenerationError::Config(ConfigError::Type { .. })), "{err}");
}
