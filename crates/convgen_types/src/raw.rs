//! Raw (unresolved) type expressions.
//!
//! A [`RawType`] is what the frontend hands us: a tree that still refers to named types by their
//! qualified name. [`crate::TypeArena`] resolves names and interns descriptors.
//!
//! The `Display` impl produces the canonical spelling of an expression. That spelling is used as the
//! interning key, so two expressions that print the same are the same type.

use std::fmt;

/// Predeclared scalar kinds.
///
/// `byte` and `rune` are accepted by the parser as aliases of `uint8` and `int32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

/// Coarse grouping used to decide whether two basic kinds convert into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicFamily {
    Bool,
    String,
    Integer,
    Float,
    Complex,
}

impl BasicKind {
    pub const ALL: [BasicKind; 17] = [
        BasicKind::Bool,
        BasicKind::String,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
        }
    }

    /// Resolve a predeclared identifier, including the `byte`/`rune` aliases.
    pub fn from_name(name: &str) -> Option<BasicKind> {
        match name {
            "byte" => Some(BasicKind::Uint8),
            "rune" => Some(BasicKind::Int32),
            _ => BasicKind::ALL.iter().copied().find(|kind| kind.name() == name),
        }
    }

    pub fn family(self) -> BasicFamily {
        match self {
            BasicKind::Bool => BasicFamily::Bool,
            BasicKind::String => BasicFamily::String,
            BasicKind::Float32 | BasicKind::Float64 => BasicFamily::Float,
            BasicKind::Complex64 | BasicKind::Complex128 => BasicFamily::Complex,
            _ => BasicFamily::Integer,
        }
    }

    /// Whether a value of `self` can be converted to `target` with an explicit conversion expression.
    ///
    /// Integers and floats convert freely between each other. Every other family only converts
    /// within itself.
    pub fn convertible_to(self, target: BasicKind) -> bool {
        use BasicFamily::*;
        match (self.family(), target.family()) {
            (Integer | Float, Integer | Float) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An unresolved type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    Basic(BasicKind),
    /// A named type, either `pkg.Name` or a bare `Name`. `error` is the builtin error interface.
    Named(String),
    Pointer(Box<RawType>),
    Slice(Box<RawType>),
    Array(usize, Box<RawType>),
    Map(Box<RawType>, Box<RawType>),
    Struct(Vec<RawField>),
    /// The empty interface. Only identical interfaces convert into each other.
    Interface,
}

/// One field of a raw struct expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawField {
    pub name: String,
    pub ty: RawType,
    /// Raw struct tag text without the surrounding quotes, e.g. `json:"id,omitempty"`.
    pub tag: String,
    pub embedded: bool,
}

impl RawType {
    pub fn named(name: impl Into<String>) -> Self {
        RawType::Named(name.into())
    }

    pub fn pointer(inner: RawType) -> Self {
        RawType::Pointer(Box::new(inner))
    }

    pub fn slice(inner: RawType) -> Self {
        RawType::Slice(Box::new(inner))
    }

    pub fn map(key: RawType, value: RawType) -> Self {
        RawType::Map(Box::new(key), Box::new(value))
    }
}

impl RawField {
    pub fn new(name: impl Into<String>, ty: RawType) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: String::new(),
            embedded: false,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// An embedded field whose name is derived from its type, `Base` for both `Base` and `*pkg.Base`.
    pub fn embedded(ty: RawType) -> Self {
        let name = embedded_name(&ty);
        Self {
            name,
            ty,
            tag: String::new(),
            embedded: true,
        }
    }
}

/// Field name implied by an embedded type expression.
pub fn embedded_name(ty: &RawType) -> String {
    match ty {
        RawType::Pointer(inner) => embedded_name(inner),
        RawType::Named(name) => name.rsplit('.').next().unwrap_or(name).to_string(),
        RawType::Basic(kind) => kind.name().to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawType::Basic(kind) => write!(f, "{kind}"),
            RawType::Named(name) => f.write_str(name),
            RawType::Pointer(inner) => write!(f, "*{inner}"),
            RawType::Slice(inner) => write!(f, "[]{inner}"),
            RawType::Array(len, inner) => write!(f, "[{len}]{inner}"),
            RawType::Map(key, value) => write!(f, "map[{key}]{value}"),
            RawType::Interface => f.write_str("interface{}"),
            RawType::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                    if !field.tag.is_empty() {
                        write!(f, " `{}`", field.tag)?;
                    }
                }
                f.write_str("}")
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
