//! Collision-free identifiers.
//!
//! One [`Namer`] exists per method body (locals) and one per converter (method names). Names are
//! never reused within a namer: `value`, `value2`, `value3`, ...

use std::collections::HashSet;

const INDEX_NAMES: [&str; 6] = ["i", "j", "k", "l", "m", "n"];

#[derive(Debug, Clone, Default)]
pub struct Namer {
    used: HashSet<String>,
}

impl Namer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namer with `names` already taken.
    pub fn with_reserved<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut namer = Self::new();
        for name in names {
            namer.reserve(name);
        }
        namer
    }

    /// Mark `name` as taken. Returns `false` if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(name.to_string())
    }

    /// `base` if free, otherwise the first free `base<N>` for N >= 2.
    pub fn name(&mut self, base: &str) -> String {
        if self.reserve(base) {
            return base.to_string();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{base}{n}");
            if self.reserve(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// A loop index name: `i`, `j`, `k`, ... then `index`, `index2`, ...
    pub fn index(&mut self) -> String {
        for candidate in INDEX_NAMES {
            if self.reserve(candidate) {
                return candidate.to_string();
            }
        }
        self.name("index")
    }
}

// ============================================================================
// Tests
// ============================================================================
