//! Scoped symbol tables.
//!
//! Scopes live in a [`ScopeTree`] arena and point at their parent by
//! [`ScopeId`]; the root scope is its own parent, which is what terminates a
//! deep lookup. Each scope maps a name to a [`Symbol`] that records where the
//! name is declared, defined and used. The node type `N` is whatever handle
//! the caller uses for source locations.

use rustc_hash::FxHashMap;

/// Index into a [`ScopeTree`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope of every tree.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which site of a symbol an occurrence records.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolHit {
    Decl,
    Defn,
    Use,
}

/// Everything known about one name in one scope.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Symbol<N> {
    pub name: String,
    /// Declared type, opaque to the table.
    pub ty: Option<String>,
    pub decl: Option<N>,
    pub defn: Vec<N>,
    pub uses: Vec<N>,
}

impl<N> Symbol<N> {
    fn new(name: String) -> Self {
        Symbol {
            name,
            ty: None,
            decl: None,
            defn: Vec::new(),
            uses: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
struct Scope<N> {
    parent: ScopeId,
    symbols: FxHashMap<String, Symbol<N>>,
}

/// Arena of scopes.
#[derive(Clone, Debug)]
pub struct ScopeTree<N> {
    scopes: Vec<Scope<N>>,
}

impl<N: Clone> Default for ScopeTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone> ScopeTree<N> {
    /// A tree holding only the root scope.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope {
                parent: ScopeId::ROOT,
                symbols: FxHashMap::default(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    /// Number of scopes, root included.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Open a new scope whose parent is `parent`.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope {
            parent,
            symbols: FxHashMap::default(),
        });
        id
    }

    /// Parent of `scope`; the root is its own parent.
    pub fn parent(&self, scope: ScopeId) -> ScopeId {
        self.scopes[scope.index()].parent
    }

    pub fn is_root(&self, scope: ScopeId) -> bool {
        self.parent(scope) == scope
    }

    /// Symbols declared directly in `scope`, in no particular order.
    pub fn symbols(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol<N>> {
        self.scopes[scope.index()].symbols.values()
    }

    /// Find `name` in `scope`, then (if `deep`) up the parent chain.
    pub fn lookup(&self, scope: ScopeId, name: &str, deep: bool) -> Option<&Symbol<N>> {
        let mut current = scope;
        loop {
            if let Some(sym) = self.scopes[current.index()].symbols.get(name) {
                return Some(sym);
            }
            let parent = self.parent(current);
            if !deep || parent == current {
                return None;
            }
            current = parent;
        }
    }

    /// Record an occurrence of `name` in `scope`.
    ///
    /// With `single`, a prior occurrence of the same kind in this scope wins:
    /// it is returned and nothing is recorded. Otherwise a declaration
    /// replaces the slot, definitions and uses are appended, and `None` is
    /// returned.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        name: &str,
        hit: SymbolHit,
        node: N,
        single: bool,
    ) -> Option<N> {
        let symbols = &mut self.scopes[scope.index()].symbols;
        let sym = symbols
            .entry(name.to_string())
            .or_insert_with(|| Symbol::new(name.to_string()));

        if single {
            let prior = match hit {
                SymbolHit::Decl => sym.decl.as_ref(),
                SymbolHit::Defn => sym.defn.last(),
                SymbolHit::Use => sym.uses.last(),
            };
            if let Some(prior) = prior {
                return Some(prior.clone());
            }
        }

        match hit {
            SymbolHit::Decl => sym.decl = Some(node),
            SymbolHit::Defn => sym.defn.push(node),
            SymbolHit::Use => sym.uses.push(node),
        }
        None
    }

    /// Set the declared type of `name` in `scope`. Returns `false` if the
    /// scope has no such symbol.
    pub fn set_type(&mut self, scope: ScopeId, name: &str, ty: impl Into<String>) -> bool {
        match self.scopes[scope.index()].symbols.get_mut(name) {
            Some(sym) => {
                sym.ty = Some(ty.into());
                true
            }
            None => false,
        }
    }
}
