//! Graph shader compilation pipeline: a [document](document::GraphDocument) is ingested into a
//! [graph](graph::Graph), [scheduled](schedule), turned into calls by the
//! [synthesizer](synth) and finally [emitted](emit) as GLSL.

pub mod compiler;
pub mod document;
pub mod emit;
pub mod graph;
pub mod library;
pub mod schedule;
pub mod store;
pub mod synth;
pub mod types;

use derive_more::Display;

use std::collections::HashSet;

#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display(fmt = "{} {}", ty, name)]
/// A `(type, name)` pair, as found in uniform/varying/attribute declarations and locals.
pub struct Declaration {
    /// GLSL type, e.g. `vec3`.
    pub ty: String,
    /// Variable name.
    pub name: String,
}

impl Declaration {
    /// Create a declaration from anything string-like.
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Insertion-ordered set of [Declaration]s, deduplicated by `(type, name)`.
pub struct DeclarationSet {
    ordered: Vec<Declaration>,
    seen: HashSet<Declaration>,
}

impl DeclarationSet {
    /// Insert a declaration, returning `false` if it was already present.
    pub fn insert(&mut self, declaration: Declaration) -> bool {
        if self.seen.contains(&declaration) {
            return false;
        }

        self.seen.insert(declaration.clone());
        self.ordered.push(declaration);
        true
    }

    /// Insert every declaration of `other` that is not already present, keeping its order.
    pub fn extend<'a>(&mut self, other: impl IntoIterator<Item = &'a Declaration>) {
        for declaration in other {
            self.insert(declaration.clone());
        }
    }

    /// Check membership.
    pub fn contains(&self, declaration: &Declaration) -> bool {
        self.seen.contains(declaration)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.ordered.iter()
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeclarationSet {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Declaration> for DeclarationSet {
    fn from_iter<T: IntoIterator<Item = Declaration>>(iter: T) -> Self {
        let mut set = Self::default();
        for declaration in iter {
            set.insert(declaration);
        }
        set
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn declaration_display() {
        assert_eq!(Declaration::new("vec3", "vNormal").to_string(), "vec3 vNormal");
    }

    #[test]
    fn set_keeps_first_insertion_order() {
        let mut set = DeclarationSet::default();
        assert!(set.insert(Declaration::new("vec3", "b")));
        assert!(set.insert(Declaration::new("vec3", "a")));
        assert!(!set.insert(Declaration::new("vec3", "b")));
        // Same name, different type is a different declaration.
        assert!(set.insert(Declaration::new("vec4", "b")));

        let names: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["vec3 b", "vec3 a", "vec4 b"]);
    }
}
