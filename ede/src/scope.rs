use indexmap::IndexMap;
use strum::IntoEnumIterator;

use crate::grammer::token::Pos;
use crate::types::{EdeType, Primitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Variable,
    Typename,
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub kind: EntryKind,
    pub ty: EdeType,
    pub pos: Pos,
}

impl Entry {
    pub fn new(kind: EntryKind, ty: EdeType, pos: Pos) -> Self {
        Entry { kind, ty, pos }
    }
}

pub type ScopeId = usize;

#[derive(Debug, Clone)]
struct Scope {
    parent: Option<ScopeId>,
    entries: IndexMap<String, Entry>,
    // Set on function scopes
    ret: Option<EdeType>,
}

/// Arena of parent-linked scopes. Scope 0 is the prelude holding the
/// primitive type names; every other scope descends from it.
#[derive(Debug, Clone)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

impl Scopes {
    pub const PRELUDE: ScopeId = 0;

    pub fn new() -> Self {
        let entries = Primitive::iter()
            .map(|p| {
                let entry = Entry::new(EntryKind::Typename, EdeType::Prim(p), Pos::default());
                (p.to_string(), entry)
            })
            .collect();
        Scopes {
            scopes: vec![Scope {
                parent: None,
                entries,
                ret: None,
            }],
        }
    }

    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            entries: IndexMap::new(),
            ret: None,
        });
        self.scopes.len() - 1
    }

    /// Scope of a function body returning `ret`.
    pub fn function(&mut self, parent: ScopeId, ret: EdeType) -> ScopeId {
        let id = self.child(parent);
        self.scopes[id].ret = Some(ret);
        id
    }

    /// Add to `id` itself. On a clash returns the position of the earlier entry.
    pub fn add(&mut self, id: ScopeId, name: &str, entry: Entry) -> Result<(), Pos> {
        if let Some(prev) = self.scopes[id].entries.get(name) {
            return Err(prev.pos);
        }
        self.scopes[id].entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn find_local(&self, id: ScopeId, name: &str) -> Option<&Entry> {
        self.scopes[id].entries.get(name)
    }

    /// Walk the parent chain from `id`.
    pub fn find(&self, id: ScopeId, name: &str) -> Option<&Entry> {
        self.ancestors(id)
            .find_map(|scope| self.scopes[scope].entries.get(name))
    }

    /// Return type of the innermost enclosing function, if any.
    pub fn return_type(&self, id: ScopeId) -> Option<&EdeType> {
        self.ancestors(id)
            .find_map(|scope| self.scopes[scope].ret.as_ref())
    }

    fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |&scope| self.scopes[scope].parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(ty: EdeType, line: usize) -> Entry {
        Entry::new(EntryKind::Variable, ty, Pos::new(line, 1))
    }

    #[test]
    fn lookup_walks_parents() {
        let mut scopes = Scopes::new();
        let module = scopes.child(Scopes::PRELUDE);
        let block = scopes.child(module);
        scopes.add(module, "a", var(EdeType::INT, 1)).unwrap();

        assert_eq!(scopes.find(block, "a").map(|e| &e.ty), Some(&EdeType::INT));
        assert!(scopes.find_local(block, "a").is_none());
        assert_eq!(
            scopes.find(block, "int").map(|e| e.kind),
            Some(EntryKind::Typename)
        );
    }

    #[test]
    fn conflict_only_in_same_scope() {
        let mut scopes = Scopes::new();
        let module = scopes.child(Scopes::PRELUDE);
        let block = scopes.child(module);
        scopes.add(module, "a", var(EdeType::INT, 1)).unwrap();
        assert!(scopes.add(block, "a", var(EdeType::BOOL, 2)).is_ok());
        assert_eq!(
            scopes.add(block, "a", var(EdeType::BOOL, 3)),
            Err(Pos::new(2, 1))
        );
        assert_eq!(scopes.find(block, "a").map(|e| &e.ty), Some(&EdeType::BOOL));
    }

    #[test]
    fn return_type() {
        let mut scopes = Scopes::new();
        let module = scopes.child(Scopes::PRELUDE);
        let func = scopes.function(module, EdeType::STRING);
        let block = scopes.child(func);
        assert_eq!(scopes.return_type(block), Some(&EdeType::STRING));
        assert_eq!(scopes.return_type(module), None);
    }
}
