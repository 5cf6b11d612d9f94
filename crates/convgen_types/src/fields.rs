//! Struct field lookup and embedded-field traversal.

use std::collections::{HashSet, VecDeque};

use crate::arena::{TypeArena, TypeId};
use crate::tags::tags_match;

/// Upper bound on embedded fields visited during one traversal.
pub const MAX_EMBEDDED_VISITS: usize = 64;

/// Parameters of a single field lookup.
#[derive(Debug, Clone, Copy)]
pub struct FieldQuery<'a> {
    pub name: &'a str,
    /// Tag of the target field; only consulted together with `tag_search`.
    pub tag: &'a str,
    pub case_insensitive: bool,
    pub ignored: Option<&'a HashSet<String>>,
    pub tag_search: &'a [String],
}

impl<'a> FieldQuery<'a> {
    /// Exact, case-sensitive lookup by name.
    pub fn exact(name: &'a str) -> Self {
        Self {
            name,
            tag: "",
            case_insensitive: false,
            ignored: None,
            tag_search: &[],
        }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored.is_some_and(|set| set.contains(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldLookupError {
    #[error("{name:?} does not exist")]
    NotFound { name: String },
    #[error("multiple matches found for {name:?}. Possible matches: {}", .candidates.join(", "))]
    Ambiguous { name: String, candidates: Vec<String> },
    #[error("`{type_name}` is not a struct")]
    NotAStruct { type_name: String },
}

/// An embedded struct reachable from a struct, with the field names leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedField {
    pub path: Vec<String>,
    /// The embedded struct, with one pointer level removed.
    pub ty: TypeId,
}

impl TypeArena {
    /// Find the field of struct `ty` answering `query`.
    ///
    /// Precedence: tag match (when `tag_search` is non-empty and the query carries a tag), then exact
    /// name, then case-insensitive name. Several tag or case-insensitive hits are ambiguous. Ignored
    /// names never match.
    pub fn field_lookup(&self, ty: TypeId, query: &FieldQuery<'_>) -> Result<FieldMatch, FieldLookupError> {
        let fields = self
            .struct_of(ty)
            .and_then(|id| self.struct_fields(id))
            .ok_or_else(|| FieldLookupError::NotAStruct {
                type_name: self.key(ty).to_string(),
            })?;

        let mut candidates = Vec::new();
        if !query.tag_search.is_empty() && !query.tag.is_empty() {
            candidates.extend(
                fields
                    .iter()
                    .filter(|f| !query.is_ignored(&f.name) && tags_match(&f.tag, query.tag, query.tag_search)),
            );
        }

        if candidates.is_empty() {
            for field in fields.iter().filter(|f| !query.is_ignored(&f.name)) {
                if field.name == query.name {
                    return Ok(FieldMatch {
                        name: field.name.clone(),
                        ty: field.ty,
                    });
                }
                if query.case_insensitive && field.name.eq_ignore_ascii_case(query.name) {
                    candidates.push(field);
                }
            }
        }

        match candidates.as_slice() {
            [] => Err(FieldLookupError::NotFound {
                name: query.name.to_string(),
            }),
            [single] => Ok(FieldMatch {
                name: single.name.clone(),
                ty: single.ty,
            }),
            many => Err(FieldLookupError::Ambiguous {
                name: query.name.to_string(),
                candidates: many.iter().map(|f| f.name.clone()).collect(),
            }),
        }
    }

    /// Embedded structs reachable from `ty`, breadth first.
    ///
    /// Each embedded struct is expanded at most once and the walk stops after
    /// [`MAX_EMBEDDED_VISITS`] fields, so self-embedding types terminate.
    pub fn embedded_fields(&self, ty: TypeId) -> Vec<EmbeddedField> {
        let mut out = Vec::new();
        let Some(root) = self.struct_of(ty) else {
            return out;
        };
        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([(Vec::<String>::new(), root)]);
        let mut visits = 0;

        while let Some((path, current)) = queue.pop_front() {
            let Some(fields) = self.struct_fields(current) else {
                continue;
            };
            for field in fields.iter().filter(|f| f.embedded) {
                visits += 1;
                if visits > MAX_EMBEDDED_VISITS {
                    tracing::debug!(root = self.key(root), "embedded field traversal hit the visit limit");
                    return out;
                }
                let Some(embedded) = self.struct_of(field.ty) else {
                    continue;
                };
                let mut next = path.clone();
                next.push(field.name.clone());
                out.push(EmbeddedField {
                    path: next.clone(),
                    ty: embedded,
                });
                if seen.insert(embedded) {
                    queue.push_back((next, embedded));
                }
            }
        }
        out
    }

    /// Look `query` up in the embedded structs of `ty`, shallowest first.
    ///
    /// Returns the promotion path and the match. Several hits at the shallowest depth with any hit
    /// are ambiguous.
    pub fn promoted_lookup(
        &self,
        ty: TypeId,
        query: &FieldQuery<'_>,
    ) -> Result<(Vec<String>, FieldMatch), FieldLookupError> {
        let embedded = self.embedded_fields(ty);
        let mut hits: Vec<(Vec<String>, FieldMatch)> = Vec::new();
        let mut depth = None;

        for candidate in embedded {
            if depth.is_some_and(|d| candidate.path.len() > d) {
                break;
            }
            match self.field_lookup(candidate.ty, query) {
                Ok(found) => {
                    depth = Some(candidate.path.len());
                    hits.push((candidate.path, found));
                }
                Err(FieldLookupError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        match hits.len() {
            0 => Err(FieldLookupError::NotFound {
                name: query.name.to_string(),
            }),
            1 => Ok(hits.remove(0)),
            _ => Err(FieldLookupError::Ambiguous {
                name: query.name.to_string(),
                candidates: hits
                    .iter()
                    .map(|(path, found)| format!("{}.{}", path.join("."), found.name))
                    .collect(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
