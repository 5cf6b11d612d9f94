//! End-to-end synthesis tests: manifest in, rendered converter methods out.

use std::collections::HashSet;

use convgen::Manifest;
use convgen::backend::ir::{CodeEmitter, Generator, IrProgram, TextEmitter};

fn manifest(json: &str) -> Manifest {
    Manifest::from_json(json).expect("manifest failed to parse")
}

fn render(json: &str) -> String {
    Generator::new(&manifest(json))
        .render(&TextEmitter::new().without_header())
        .expect("generation failed")
}

fn generate(json: &str) -> IrProgram {
    Generator::new(&manifest(json)).generate().expect("generation failed")
}

/// The rendered method `name`, from its signature line to its closing brace.
fn method<'a>(output: &'a str, name: &str) -> &'a str {
    let header = format!("func (c *ConverterImpl) {}(", name);
    let start = output
        .find(&header)
        .unwrap_or_else(|| panic!("method {} not found in:\n{}", name, output));
    let rest = &output[start..];
    let end = rest.find("\n}\n").map(|i| i + 3).unwrap_or(rest.len());
    &rest[..end]
}

/// Names introduced with `:=` or `var` in one rendered method.
fn bindings(body: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in body.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("var ") {
            if let Some(name) = rest.split_whitespace().next() {
                names.push(name.to_string());
            }
        } else if let Some((lhs, _)) = line.split_once(" := ") {
            if line.starts_with("for ") {
                continue;
            }
            names.extend(lhs.split(", ").map(str::to_string));
        }
    }
    names
}

// ============================================================================
// Field mapping
// ============================================================================

#[test]
fn test_dotted_mapping_through_pointer_is_guarded() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.Meta": "struct { CreatedAt string }",
                "app.Event": "struct { Meta *app.Meta }",
                "app.Flat": "struct { RegisterAt string }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{
                    "name": "Convert",
                    "params": ["app.Event"],
                    "results": ["app.Flat"],
                    "map": { "RegisterAt": "Meta.CreatedAt" }
                }]
            }]
        }"#,
    );
    let body = method(&output, "appEventIntoAppFlat");
    assert!(body.contains("\tvar pString *string\n"), "{body}");
    assert!(body.contains("\tif in.Meta != nil {\n\t\tpString = &in.Meta.CreatedAt\n\t}\n"), "{body}");
    assert!(body.contains("\tif pString != nil {\n\t\txstring = *pString\n\t}\n"), "{body}");
    assert!(body.contains("\tout.RegisterAt = xstring\n"), "{body}");
}

#[test]
fn test_case_insensitive_and_tag_matching() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { ID int64; FullName string `json:\"name\"` }",
                "app.B": "struct { Id int64; Name string `json:\"name,omitempty\"` }"
            },
            "converters": [{
                "name": "Converter",
                "tag_search": ["json"],
                "methods": [{
                    "name": "Convert",
                    "params": ["app.A"],
                    "results": ["app.B"],
                    "match_ignore_case": true
                }]
            }]
        }"#,
    );
    let body = method(&output, "appAIntoAppB");
    assert!(body.contains("out.Id = in.ID"), "{body}");
    assert!(body.contains("out.Name = in.FullName"), "{body}");
}

#[test]
fn test_promoted_field_from_embedded_source() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.Base": "struct { Id int64 }",
                "app.User": "struct { app.Base; Name string }",
                "app.UserDTO": "struct { Id int64; Name string }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{ "name": "Convert", "params": ["app.User"], "results": ["app.UserDTO"] }]
            }]
        }"#,
    );
    let body = method(&output, "appUserIntoAppUserDTO");
    assert!(body.contains("out.Id = in.Base.Id"), "{body}");
    assert!(body.contains("out.Name = in.Name"), "{body}");
}

#[test]
fn test_ignored_fields_are_left_alone() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { Name string }",
                "app.B": "struct { Name string; Secret string }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{
                    "name": "Convert",
                    "params": ["app.A"],
                    "results": ["app.B"],
                    "ignore": ["Secret"]
                }]
            }]
        }"#,
    );
    assert!(!output.contains("Secret"), "{output}");
    assert!(output.contains("out.Name = in.Name"), "{output}");
}

#[test]
fn test_identity_field_uses_whole_source() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.Src": "struct { Name string }",
                "app.Inner": "struct { Name string }",
                "app.Wrap": "struct { Inner app.Inner; Name string }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{
                    "name": "Convert",
                    "params": ["app.Src"],
                    "results": ["app.Wrap"],
                    "identity": ["Inner"]
                }]
            }]
        }"#,
    );
    let body = method(&output, "appSrcIntoAppWrap");
    assert!(body.contains("c.appSrcIntoAppInner(in, &out.Inner)"), "{body}");
    let inner = method(&output, "appSrcIntoAppInner");
    assert!(inner.contains("out.Name = in.Name"), "{inner}");
}

#[test]
fn test_embedded_target_from_checked_source_has_no_extra_guard() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.Src": "struct { Name string; Extra string }",
                "app.Base": "struct { Name string }",
                "app.Wrap": "struct { *app.Base; Extra string }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{ "name": "Fill", "params": ["*app.Src", "*app.Wrap"], "results": [] }]
            }]
        }"#,
    );
    let body = method(&output, "Fill");
    assert!(body.contains("\tif in == nil || out == nil {\n\t\treturn\n\t}\n"), "{body}");
    assert!(
        body.contains("\tout.Base = new(Base)\n\tc.appSrcIntoAppBase(in, out.Base)\n"),
        "{body}"
    );
    assert!(!body.contains("if in != nil"), "{body}");
}

// ============================================================================
// Methods and recursion
// ============================================================================

#[test]
fn test_in_place_method_returns_early_on_nil() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { Name string }",
                "app.B": "struct { Name string }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{ "name": "Fill", "params": ["*app.A", "*app.B"], "results": [] }]
            }]
        }"#,
    );
    let body = method(&output, "Fill");
    assert!(body.starts_with("func (c *ConverterImpl) Fill(in *A, out *B) {\n"), "{body}");
    assert!(body.contains("\tif in == nil || out == nil {\n\t\treturn\n\t}\n"), "{body}");
    assert!(body.contains("\tout.Name = in.Name\n"), "{body}");
    assert!(!output.contains("appAIntoAppB"), "declared in-place method is reused:\n{output}");
}

#[test]
fn test_nested_in_place_need_reuses_declared_method() {
    let program = generate(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { Name string }",
                "app.B": "struct { Name string }",
                "app.Outer": "struct { Item app.A }",
                "app.OuterDTO": "struct { Item app.B }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [
                    { "name": "Fill", "params": ["*app.A", "*app.B"], "results": [] },
                    { "name": "Convert", "params": ["app.Outer"], "results": ["app.OuterDTO"] }
                ]
            }]
        }"#,
    );
    let names: Vec<&str> = program.converters[0].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Convert", "Fill", "appOuterIntoAppOuterDTO"]);

    let text = TextEmitter::new().without_header().emit_program(&program).unwrap();
    let body = method(&text, "appOuterIntoAppOuterDTO");
    assert!(body.contains("c.Fill(&in.Item, &out.Item)"), "{body}");
}

#[test]
fn test_self_referencing_types_terminate() {
    let json = r#"{
        "package": "app",
        "types": {
            "app.Person": "struct { Name string; Best *app.Person }",
            "app.PersonDTO": "struct { Name string; Best *app.PersonDTO }"
        },
        "converters": [{
            "name": "Converter",
            "methods": [{ "name": "Convert", "params": ["app.Person"], "results": ["app.PersonDTO"] }]
        }]
    }"#;
    let program = generate(json);
    assert_eq!(program.converters[0].methods.len(), 2);

    let output = render(json);
    let body = method(&output, "appPersonIntoAppPersonDTO");
    assert!(
        body.contains(
            "\tif in.Best != nil {\n\t\tout.Best = new(PersonDTO)\n\t\tc.appPersonIntoAppPersonDTO(in.Best, out.Best)\n\t}\n"
        ),
        "{body}"
    );
}

#[test]
fn test_declared_value_source_method_is_guarded_for_pointer_fields() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { Name string }",
                "app.B": "struct { Name string }",
                "app.Outer": "struct { Item *app.A }",
                "app.OuterDTO": "struct { Item app.B }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [
                    { "name": "Fill", "params": ["app.A", "*app.B"], "results": [] },
                    { "name": "Convert", "params": ["app.Outer"], "results": ["app.OuterDTO"] }
                ]
            }]
        }"#,
    );
    let body = method(&output, "appOuterIntoAppOuterDTO");
    assert!(
        body.contains("\tif in.Item != nil {\n\t\tc.Fill(*in.Item, &out.Item)\n\t}\n"),
        "{body}"
    );
    let fill = method(&output, "Fill");
    assert!(fill.starts_with("func (c *ConverterImpl) Fill(in A, out *B) {\n"), "{fill}");
}

#[test]
fn test_mutually_recursive_types_terminate() {
    let json = r#"{
        "package": "app",
        "types": {
            "app.A": "struct { Name string; B *app.B }",
            "app.B": "struct { Name string; A *app.A }",
            "app.ADTO": "struct { Name string; B *app.BDTO }",
            "app.BDTO": "struct { Name string; A *app.ADTO }"
        },
        "converters": [{
            "name": "Converter",
            "methods": [{ "name": "Convert", "params": ["app.A"], "results": ["app.ADTO"] }]
        }]
    }"#;
    let program = generate(json);
    let names: Vec<&str> = program.converters[0].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Convert", "appAIntoAppADTO", "appBIntoAppBDTO"]);

    let output = render(json);
    let a = method(&output, "appAIntoAppADTO");
    assert!(
        a.contains("\tif in.B != nil {\n\t\tout.B = new(BDTO)\n\t\tc.appBIntoAppBDTO(in.B, out.B)\n\t}\n"),
        "{a}"
    );
    let b = method(&output, "appBIntoAppBDTO");
    assert!(
        b.contains("\tif in.A != nil {\n\t\tout.A = new(ADTO)\n\t\tc.appAIntoAppADTO(in.A, out.A)\n\t}\n"),
        "{b}"
    );
}

#[test]
fn test_methods_are_sorted_by_name() {
    let program = generate(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { X int }",
                "app.B": "struct { X int }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [
                    { "name": "Zeta", "params": ["app.A"], "results": ["app.B"] },
                    { "name": "Alpha", "params": ["[]app.A"], "results": ["[]app.B"] }
                ]
            }]
        }"#,
    );
    let names: Vec<&str> = program.converters[0].methods.iter().map(|m| m.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(names.contains(&"appAIntoAppB"));
}

// ============================================================================
// Collections and nil preservation
// ============================================================================

#[test]
fn test_nil_map_stays_nil() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.A": "struct { Tags map[string]int32 }",
                "app.B": "struct { Tags map[string]int64 }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{ "name": "Convert", "params": ["app.A"], "results": ["app.B"] }]
            }]
        }"#,
    );
    let body = method(&output, "appAIntoAppB");
    let expected = "\tvar mapStringInt64 map[string]int64
\tif in.Tags != nil {
\t\tmapStringInt64 = make(map[string]int64, len(in.Tags))
\t\tfor key, value := range in.Tags {
\t\t\tmapStringInt64[key] = int64(value)
\t\t}
\t}
\tout.Tags = mapStringInt64
";
    assert!(body.contains(expected), "{body}");
}

#[test]
fn test_pointer_field_allocated_inside_guard() {
    let output = render(
        r#"{
            "package": "app",
            "types": {
                "app.Address": "struct { Street string }",
                "app.AddressDTO": "struct { Street string }",
                "app.A": "struct { Home *app.Address }",
                "app.B": "struct { Home *app.AddressDTO }"
            },
            "converters": [{
                "name": "Converter",
                "methods": [{ "name": "Convert", "params": ["app.A"], "results": ["app.B"] }]
            }]
        }"#,
    );
    let body = method(&output, "appAIntoAppB");
    assert!(
        body.contains("\tif in.Home != nil {\n\t\tout.Home = new(AddressDTO)\n\t\tc.appAddressIntoAppAddressDTO(in.Home, out.Home)\n\t}\n"),
        "{body}"
    );
}

// ============================================================================
// Extends
// ============================================================================

const EXTEND_TYPES: &str = r#"
    "package": "app",
    "types": {
        "app.A": "struct { Id string }",
        "app.B": "struct { Id int64 }"
    }
"#;

#[test]
fn test_method_extend_beats_converter_extend() {
    let output = render(&format!(
        r#"{{
            {EXTEND_TYPES},
            "extends": [{{ "name": "conv.Global", "params": ["string"], "results": ["int64"] }}],
            "converters": [{{
                "name": "Converter",
                "methods": [{{
                    "name": "Convert",
                    "params": ["app.A"],
                    "results": ["app.B"],
                    "extends": [{{ "name": "conv.Local", "params": ["string"], "results": ["int64"] }}]
                }}]
            }}]
        }}"#
    ));
    assert!(output.contains("out.Id = conv.Local(in.Id)"), "{output}");
    assert!(!output.contains("conv.Global"), "{output}");
}

#[test]
fn test_converter_extend_overrides_manifest_extend() {
    let output = render(&format!(
        r#"{{
            {EXTEND_TYPES},
            "extends": [{{ "name": "conv.First", "params": ["string"], "results": ["int64"] }}],
            "converters": [{{
                "name": "Converter",
                "extends": [{{ "name": "conv.Second", "params": ["string"], "results": ["int64"] }}],
                "methods": [{{ "name": "Convert", "params": ["app.A"], "results": ["app.B"] }}]
            }}]
        }}"#
    ));
    assert!(output.contains("out.Id = conv.Second(in.Id)"), "{output}");
}

#[test]
fn test_extend_taking_the_converter() {
    let output = render(&format!(
        r#"{{
            {EXTEND_TYPES},
            "extends": [{{ "name": "conv.Parse", "params": ["app.Converter", "string"], "results": ["int64"] }}],
            "converters": [{{
                "name": "Converter",
                "methods": [{{ "name": "Convert", "params": ["app.A"], "results": ["app.B"] }}]
            }}]
        }}"#
    ));
    assert!(output.contains("out.Id = conv.Parse(c, in.Id)"), "{output}");
}

// ============================================================================
// Naming and determinism
// ============================================================================

const TWO_FALLIBLE_FIELDS: &str = r#"{
    "package": "app",
    "types": {
        "app.A": "struct { X string; Y string }",
        "app.B": "struct { X int64; Y int64 }"
    },
    "extends": [{ "name": "app.ParseID", "params": ["string"], "results": ["int64", "error"] }],
    "converters": [{
        "name": "Converter",
        "methods": [{ "name": "Convert", "params": ["app.A"], "results": ["app.B", "error"] }]
    }]
}"#;

#[test]
fn test_no_duplicate_bindings_in_one_body() {
    let output = render(TWO_FALLIBLE_FIELDS);
    let body = method(&output, "appAIntoAppB");
    assert!(body.contains("xint64, err := ParseID(in.X)"), "{body}");
    assert!(body.contains("xint642, err2 := ParseID(in.Y)"), "{body}");

    for chunk in output.split("\nfunc ").skip(1) {
        let names = bindings(chunk);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len(), "duplicate binding in:\n{chunk}");
    }
}

#[test]
fn test_generation_is_deterministic() {
    let first = render(TWO_FALLIBLE_FIELDS);
    for _ in 0..5 {
        assert_eq!(render(TWO_FALLIBLE_FIELDS), first);
    }
}
