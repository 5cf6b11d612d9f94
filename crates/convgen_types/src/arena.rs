//! Interned type descriptors.
//!
//! Every distinct type gets exactly one [`TypeDescriptor`] in the [`TypeArena`] and is referred to
//! by a copyable [`TypeId`]. Descriptors are keyed by their canonical spelling, so identity of two
//! types is identity of their ids.
//!
//! ## Notes
//!
//! - Named types are classified lazily from their declarations. The id of a named type is reserved
//!   before its underlying expression is classified, which makes self-referential and mutually
//!   recursive declarations (`type Node struct { Next *Node }`) terminate.
//! - A named type carries the shape of its underlying type; rules look through names.
//! - Pointer types can be created on demand with [`TypeArena::pointer_to`]. Lookups that must not grow the
//!   arena use [`TypeArena::find_pointer_to`].

use std::collections::HashMap;

use crate::parse::ParseTypeError;
use crate::raw::{BasicKind, RawType};

/// Handle of an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Package-qualified name of a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedIdent {
    pub package: Option<String>,
    pub name: String,
}

impl NamedIdent {
    pub fn parse(qualified: &str) -> Self {
        match qualified.rsplit_once('.') {
            Some((package, name)) => Self {
                package: Some(package.to_string()),
                name: name.to_string(),
            },
            None => Self {
                package: None,
                name: qualified.to_string(),
            },
        }
    }
}

/// A resolved struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeId,
    pub tag: String,
    pub embedded: bool,
}

impl FieldDef {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

/// Identifiers starting with an uppercase letter are visible outside their package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Structural shape of a type. Named types report the shape of their underlying type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Basic(BasicKind),
    /// Pointer to exactly one level of indirection.
    Pointer(TypeId),
    Struct(Vec<FieldDef>),
    /// Slices (`len == None`) and fixed-length arrays.
    List { elem: TypeId, len: Option<usize> },
    Map { key: TypeId, value: TypeId },
    Interface,
    /// Reserved slot of a named type whose underlying type is still being classified.
    Pending,
}

#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    key: String,
    named: Option<NamedIdent>,
    shape: Shape,
}

impl TypeDescriptor {
    /// Canonical spelling, e.g. `*app.User` or `map[string]int`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn named(&self) -> Option<&NamedIdent> {
        self.named.as_ref()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_named(&self) -> bool {
        self.named.is_some()
    }

    pub fn is_basic(&self) -> bool {
        matches!(self.shape, Shape::Basic(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.shape, Shape::Struct(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.shape, Shape::Pointer(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.shape, Shape::Interface)
    }
}

/// Errors raised while declaring or resolving types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error(transparent)]
    Parse(#[from] ParseTypeError),
    #[error("unknown type `{name}`")]
    Unknown { name: String },
    #[error("type `{name}` is declared more than once")]
    Duplicate { name: String },
    #[error("`{name}` is predeclared and cannot be redeclared")]
    Predeclared { name: String },
    #[error("invalid recursive type `{name}`")]
    InvalidRecursive { name: String },
}

/// Owner of every type descriptor used during generation.
#[derive(Debug, Clone)]
pub struct TypeArena {
    descriptors: Vec<TypeDescriptor>,
    by_key: HashMap<String, TypeId>,
    declarations: HashMap<String, RawType>,
}

pub const ERROR_TYPE: &str = "error";

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = Self {
            descriptors: Vec::new(),
            by_key: HashMap::new(),
            declarations: HashMap::new(),
        };
        arena.intern(ERROR_TYPE.to_string(), Some(NamedIdent::parse(ERROR_TYPE)), Shape::Interface);
        arena
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Declare a named type. Classification happens on first use.
    pub fn declare(&mut self, name: impl Into<String>, underlying: RawType) -> Result<(), TypeError> {
        let name = name.into();
        if name == ERROR_TYPE || BasicKind::from_name(&name).is_some() {
            return Err(TypeError::Predeclared { name });
        }
        if self.declarations.contains_key(&name) {
            return Err(TypeError::Duplicate { name });
        }
        self.declarations.insert(name, underlying);
        Ok(())
    }

    /// Parse `source` and declare it as the underlying type of `name`.
    pub fn declare_str(&mut self, name: impl Into<String>, source: &str) -> Result<(), TypeError> {
        let underlying = RawType::parse(source)?;
        self.declare(name, underlying)
    }

    /// Names of all declared types, sorted.
    pub fn declared_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.declarations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Parse and classify a type expression.
    pub fn parse(&mut self, source: &str) -> Result<TypeId, TypeError> {
        let raw = RawType::parse(source)?;
        self.classify(&raw)
    }

    /// Resolve a raw expression into an interned descriptor.
    pub fn classify(&mut self, raw: &RawType) -> Result<TypeId, TypeError> {
        let key = raw.to_string();
        if let Some(&id) = self.by_key.get(&key) {
            return Ok(id);
        }
        let shape = match raw {
            RawType::Named(name) => return self.classify_named(name),
            RawType::Basic(kind) => Shape::Basic(*kind),
            RawType::Pointer(inner) => Shape::Pointer(self.classify(inner)?),
            RawType::Slice(inner) => Shape::List {
                elem: self.classify(inner)?,
                len: None,
            },
            RawType::Array(len, inner) => Shape::List {
                elem: self.classify(inner)?,
                len: Some(*len),
            },
            RawType::Map(key, value) => Shape::Map {
                key: self.classify(key)?,
                value: self.classify(value)?,
            },
            RawType::Struct(raw_fields) => {
                let mut fields = Vec::with_capacity(raw_fields.len());
                for field in raw_fields {
                    fields.push(FieldDef {
                        name: field.name.clone(),
                        ty: self.classify(&field.ty)?,
                        tag: field.tag.clone(),
                        embedded: field.embedded,
                    });
                }
                Shape::Struct(fields)
            }
            RawType::Interface => Shape::Interface,
        };
        Ok(self.intern(key, None, shape))
    }

    fn classify_named(&mut self, name: &str) -> Result<TypeId, TypeError> {
        if let Some(&id) = self.by_key.get(name) {
            return Ok(id);
        }
        let underlying = self
            .declarations
            .get(name)
            .cloned()
            .ok_or_else(|| TypeError::Unknown { name: name.to_string() })?;

        let id = self.intern(name.to_string(), Some(NamedIdent::parse(name)), Shape::Pending);
        let resolved = self.classify(&underlying)?;
        let shape = self.descriptors[resolved.index()].shape.clone();
        if matches!(shape, Shape::Pending) {
            return Err(TypeError::InvalidRecursive { name: name.to_string() });
        }
        self.descriptors[id.index()].shape = shape;
        tracing::trace!(name, id = id.index(), "classified named type");
        Ok(id)
    }

    fn intern(&mut self, key: String, named: Option<NamedIdent>, shape: Shape) -> TypeId {
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = TypeId(self.descriptors.len() as u32);
        self.by_key.insert(key.clone(), id);
        self.descriptors.push(TypeDescriptor { key, named, shape });
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.descriptors[id.index()]
    }

    /// Look up an already interned type by its canonical spelling.
    pub fn lookup(&self, key: &str) -> Option<TypeId> {
        self.by_key.get(key).copied()
    }

    pub fn key(&self, id: TypeId) -> &str {
        &self.get(id).key
    }

    /// Intern `*T` for `id`.
    pub fn pointer_to(&mut self, id: TypeId) -> TypeId {
        let key = format!("*{}", self.get(id).key);
        self.intern(key, None, Shape::Pointer(id))
    }

    /// `*T` for `id` if it has been interned already.
    pub fn find_pointer_to(&self, id: TypeId) -> Option<TypeId> {
        self.lookup(&format!("*{}", self.get(id).key))
    }

    /// The pointee of a pointer type.
    pub fn deref(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id).shape {
            Shape::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        self.get(id).is_pointer()
    }

    pub fn is_struct(&self, id: TypeId) -> bool {
        self.get(id).is_struct()
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        self.get(id).key == ERROR_TYPE
    }

    pub fn is_pointer_to_struct(&self, id: TypeId) -> bool {
        self.deref(id).is_some_and(|inner| self.is_struct(inner))
    }

    /// The struct behind `id`: `id` itself for a struct, the pointee for a pointer to a struct.
    pub fn struct_of(&self, id: TypeId) -> Option<TypeId> {
        if self.is_struct(id) {
            return Some(id);
        }
        self.deref(id).filter(|&inner| self.is_struct(inner))
    }

    pub fn struct_fields(&self, id: TypeId) -> Option<&[FieldDef]> {
        match &self.get(id).shape {
            Shape::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Deterministic identifier for `id`, usable as a variable name.
    ///
    /// Named types become `<package><Name>`, lists `<elem>List`, pointers `p<Elem>` and maps
    /// `map<Key><Value>`. Bare basic and struct names are prefixed with `x` so they never collide with
    /// keywords.
    pub fn ident(&self, id: TypeId) -> String {
        self.ident_inner(id, true)
    }

    /// Like [`TypeArena::ident`] but without escaping reserved words.
    pub fn unescaped_ident(&self, id: TypeId) -> String {
        self.ident_inner(id, false)
    }

    fn ident_inner(&self, id: TypeId, escape: bool) -> String {
        let descriptor = self.get(id);
        if let Some(named) = &descriptor.named {
            return format!("{}{}", named.package.as_deref().unwrap_or(""), named.name);
        }
        match &descriptor.shape {
            Shape::List { elem, .. } => format!("{}List", self.ident_inner(*elem, false)),
            Shape::Basic(kind) if escape => format!("x{kind}"),
            Shape::Basic(kind) => kind.name().to_string(),
            Shape::Pointer(inner) => format!("p{}", title(&self.ident_inner(*inner, false))),
            Shape::Map { key, value } => format!(
                "map{}",
                title(&format!(
                    "{}{}",
                    self.ident_inner(*key, false),
                    title(&self.ident_inner(*value, false))
                ))
            ),
            Shape::Struct(_) if escape => "xstruct".to_string(),
            Shape::Struct(_) => "struct".to_string(),
            Shape::Interface => "iface".to_string(),
            Shape::Pending => "unknown".to_string(),
        }
    }
}

/// Uppercase the first character.
pub fn title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(decls: &[(&str, &str)]) -> TypeArena {
        let mut arena = TypeArena::new();
        for (name, src) in decls {
            arena.declare_str(*name, src).unwrap();
        }
        arena
    }

    #[test]
    fn test_interning_is_by_canonical_spelling() {
        let mut types = arena(&[("app.User", "struct{Name string}")]);
        let a = types.parse("*app.User").unwrap();
        let b = types.parse("* app.User").unwrap();
        assert_eq!(a, b);
        let user = types.parse("app.User").unwrap();
        assert_eq!(types.pointer_to(user), a);
        assert_eq!(types.find_pointer_to(user), Some(a));
        assert_eq!(types.deref(a), Some(user));
    }

    #[test]
    fn test_find_pointer_to_does_not_intern() {
        let mut types = TypeArena::new();
        let int = types.parse("int").unwrap();
        let before = types.len();
        assert_eq!(types.find_pointer_to(int), None);
        assert_eq!(types.len(), before);
    }

    #[test]
    fn test_named_type_carries_underlying_shape() {
        let mut types = arena(&[("app.Id", "int64"), ("app.Alias", "app.Other"), ("app.Other", "struct{X int}")]);
        let id = types.parse("app.Id").unwrap();
        assert_eq!(types.get(id).shape(), &Shape::Basic(BasicKind::Int64));
        assert!(types.get(id).is_named());
        let alias = types.parse("app.Alias").unwrap();
        assert!(types.is_struct(alias));
    }

    #[test]
    fn test_recursive_declarations_terminate() {
        let mut types = arena(&[
            ("app.A", "struct{Name string; B *app.B}"),
            ("app.B", "struct{A *app.A; Children []app.B}"),
            ("app.Node", "struct{Next *app.Node}"),
        ]);
        let a = types.parse("app.A").unwrap();
        let b = types.parse("app.B").unwrap();
        let fields = types.struct_fields(a).unwrap().to_vec();
        assert_eq!(types.deref(fields[1].ty), Some(b));
        let node = types.parse("app.Node").unwrap();
        let next = types.struct_fields(node).unwrap()[0].ty;
        assert_eq!(types.deref(next), Some(node));
    }

    #[test]
    fn test_invalid_recursive_declaration() {
        let mut types = arena(&[("app.X", "app.Y"), ("app.Y", "app.X")]);
        assert!(matches!(types.parse("app.X"), Err(TypeError::InvalidRecursive { .. })));
    }

    #[test]
    fn test_declaration_errors() {
        let mut types = TypeArena::new();
        assert!(matches!(types.declare_str("error", "int"), Err(TypeError::Predeclared { .. })));
        assert!(matches!(types.declare_str("int", "string"), Err(TypeError::Predeclared { .. })));
        types.declare_str("app.A", "int").unwrap();
        assert!(matches!(types.declare_str("app.A", "int"), Err(TypeError::Duplicate { .. })));
        assert!(matches!(types.parse("app.Missing"), Err(TypeError::Unknown { .. })));
    }

    #[test]
    fn test_error_is_builtin_interface() {
        let mut types = TypeArena::new();
        let err = types.parse("error").unwrap();
        assert!(types.is_error(err));
        assert!(types.get(err).is_interface());
        assert_eq!(types.ident(err), "error");
    }

    #[test]
    fn test_idents() {
        let mut types = arena(&[("app.User", "struct{Name string}")]);
        let cases = [
            ("app.User", "appUser"),
            ("*app.User", "pAppUser"),
            ("[]app.User", "appUserList"),
            ("[]*app.User", "pAppUserList"),
            ("map[string]int", "mapStringInt"),
            ("int", "xint"),
            ("struct{A int}", "xstruct"),
        ];
        for (src, expected) in cases {
            let id = types.parse(src).unwrap();
            assert_eq!(types.ident(id), expected, "{src}");
        }
        let int = types.parse("int").unwrap();
        assert_eq!(types.unescaped_ident(int), "int");
    }

    #[test]
    fn test_struct_of() {
        let mut types = arena(&[("app.User", "struct{Name string}")]);
        let user = types.parse("app.User").unwrap();
        let ptr = types.parse("*app.User").unwrap();
        let pptr = types.parse("**app.User").unwrap();
        assert_eq!(types.struct_of(user), Some(user));
        assert_eq!(types.struct_of(ptr), Some(user));
        assert_eq!(types.struct_of(pptr), None);
        assert!(types.is_pointer_to_struct(ptr));
    }
}
