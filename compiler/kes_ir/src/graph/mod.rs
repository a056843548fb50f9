//! The linked module forest.
//!
//! Every module reached during one compilation run lives in a single
//! [`ModuleGraph`] arena and is addressed by [`ModuleId`]. Import targets are
//! stored in a parallel arena addressed by [`ModulePathId`], so a worklist can
//! hold stable handles while module child sequences keep growing.
//!
//! Links between modules (`sub_module`, annexes) are ids, never owning
//! pointers, which is what lets an import cycle `a -> b -> a` exist without an
//! ownership cycle.
//!
//! The graph doubles as the run's import table: [`ModuleGraph::lookup`] maps a
//! canonical file path to the one live module for it.

use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::{path, Decl, ImplDef, ImportTarget, ParsedItem, ParsedModule, SourceLang, Span};

/// Index into the module arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ModuleId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

/// Index into the module-path arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ModulePathId(u32);

impl ModulePathId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ModulePathId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ModulePathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModulePathId({})", self.0)
    }
}

/// A node a diagnostic can be attributed to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeRef {
    Module(ModuleId),
    ModulePath(ModulePathId),
}

/// Where an annexed child goes in its owner's child sequence.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ChildPosition {
    /// Before every existing child.
    Prepend,
    /// After every existing child.
    Append,
}

/// The two kinds of side file a module can own.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AnnexKind {
    /// `<stem>.impl.<ext>`: deferred bodies, visited before the owner's items.
    Impl,
    /// `<stem>.test.<ext>`: tests, visited after the owner's items.
    Test,
}

impl AnnexKind {
    /// Infix used in the side file's name.
    pub fn infix(self) -> &'static str {
        match self {
            AnnexKind::Impl => "impl",
            AnnexKind::Test => "test",
        }
    }

    pub fn position(self) -> ChildPosition {
        match self {
            AnnexKind::Impl => ChildPosition::Prepend,
            AnnexKind::Test => ChildPosition::Append,
        }
    }
}

/// An import statement inside a linked module.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ImportStmt {
    pub lang: SourceLang,
    pub paths: Vec<ModulePathId>,
    pub span: Span,
}

/// One child of a module, in visiting order.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ModuleItem {
    Import(ImportStmt),
    Decl(Decl),
    Impl(ImplDef),
    /// An annexed impl or test module.
    Annex(ModuleId),
}

/// One import target inside the forest.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ModulePath {
    pub target: ImportTarget,
    /// Language of the owning import statement.
    pub lang: SourceLang,
    /// Module whose import statement holds this path.
    pub owner: ModuleId,
    /// The module this path resolved to, once linked.
    pub sub_module: Option<ModuleId>,
}

impl ModulePath {
    pub fn is_resolved(&self) -> bool {
        self.sub_module.is_some()
    }
}

/// A parsed source unit with its links.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Module {
    /// Externally visible name. Starts as the file stem, rebound by aliases.
    pub name: String,
    /// Canonical file path; also the import-table key.
    pub path: PathBuf,
    pub lang: SourceLang,
    /// Ordered children.
    pub items: Vec<ModuleItem>,
    pub impl_annex: Option<ModuleId>,
    pub test_annex: Option<ModuleId>,
    /// False only for the entry unit of a run.
    pub is_imported: bool,
    /// Everything reachable from this module, by canonical path.
    ///
    /// Populated on the entry module when resolution finishes.
    pub mod_deps: FxHashMap<PathBuf, ModuleId>,
}

impl Module {
    pub fn annex(&self, kind: AnnexKind) -> Option<ModuleId> {
        match kind {
            AnnexKind::Impl => self.impl_annex,
            AnnexKind::Test => self.test_annex,
        }
    }

    /// Import statements in child order (annexes not included).
    pub fn imports(&self) -> impl Iterator<Item = &ImportStmt> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Import(imp) => Some(imp),
            _ => None,
        })
    }
}

/// Arena of modules and module paths plus the path-keyed import table.
#[derive(Clone, Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    paths: Vec<ModulePath>,
    by_path: FxHashMap<PathBuf, ModuleId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of modules in the graph.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Drop every module and path, starting a fresh run.
    pub fn clear(&mut self) {
        self.modules.clear();
        self.paths.clear();
        self.by_path.clear();
    }

    /// Module cached under `path`, if any.
    pub fn lookup(&self, path: &Path) -> Option<ModuleId> {
        self.by_path.get(path).copied()
    }

    /// The path-keyed import table.
    pub fn import_table(&self) -> &FxHashMap<PathBuf, ModuleId> {
        &self.by_path
    }

    /// Move a parsed file into the graph and cache it under `path`.
    ///
    /// At most one module exists per path: inserting a path that is already
    /// cached returns the cached module and discards `parsed`.
    pub fn insert(&mut self, path: PathBuf, lang: SourceLang, parsed: ParsedModule) -> ModuleId {
        if let Some(existing) = self.lookup(&path) {
            return existing;
        }

        let id = ModuleId::new(to_u32(self.modules.len()));
        let mut items = Vec::with_capacity(parsed.items.len());
        for item in parsed.items {
            items.push(match item {
                ParsedItem::Import(imp) => {
                    let paths = imp
                        .targets
                        .into_iter()
                        .map(|target| self.alloc_path(target, imp.lang, id))
                        .collect();
                    ModuleItem::Import(ImportStmt {
                        lang: imp.lang,
                        paths,
                        span: imp.span,
                    })
                }
                ParsedItem::Decl(decl) => ModuleItem::Decl(decl),
                ParsedItem::Impl(def) => ModuleItem::Impl(def),
            });
        }

        self.modules.push(Module {
            name: path::module_name(&path),
            path: path.clone(),
            lang,
            items,
            impl_annex: None,
            test_annex: None,
            is_imported: false,
            mod_deps: FxHashMap::default(),
        });
        self.by_path.insert(path, id);
        id
    }

    fn alloc_path(&mut self, target: ImportTarget, lang: SourceLang, owner: ModuleId) -> ModulePathId {
        let id = ModulePathId::new(to_u32(self.paths.len()));
        self.paths.push(ModulePath {
            target,
            lang,
            owner,
            sub_module: None,
        });
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId::new(to_u32(i)), m))
    }

    pub fn path(&self, id: ModulePathId) -> &ModulePath {
        &self.paths[id.index()]
    }

    /// Link a module path to the module it resolved to.
    pub fn link(&mut self, path: ModulePathId, module: ModuleId) {
        self.paths[path.index()].sub_module = Some(module);
    }

    /// Attach `annex` to `owner` as its `kind` annex.
    ///
    /// Returns `false` without touching the tree if that annex slot is
    /// already filled, so re-running annexation never duplicates children.
    pub fn attach_annex(&mut self, owner: ModuleId, kind: AnnexKind, annex: ModuleId) -> bool {
        let module = self.module_mut(owner);
        let slot = match kind {
            AnnexKind::Impl => &mut module.impl_annex,
            AnnexKind::Test => &mut module.test_annex,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(annex);
        self.insert_child(owner, ModuleItem::Annex(annex), kind.position());
        true
    }

    /// Insert a child into a module's ordered child sequence.
    pub fn insert_child(&mut self, owner: ModuleId, child: ModuleItem, position: ChildPosition) {
        let items = &mut self.module_mut(owner).items;
        match position {
            ChildPosition::Prepend => items.insert(0, child),
            ChildPosition::Append => items.push(child),
        }
    }

    /// Every module path in `id`'s subtree, in child order.
    ///
    /// Annexed children are part of the subtree; modules reached through
    /// `sub_module` links are not.
    pub fn collect_paths(&self, id: ModuleId) -> Vec<ModulePathId> {
        let mut out = Vec::new();
        self.collect_paths_into(id, &mut out);
        out
    }

    fn collect_paths_into(&self, id: ModuleId, out: &mut Vec<ModulePathId>) {
        for item in &self.module(id).items {
            match item {
                ModuleItem::Import(imp) => out.extend(imp.paths.iter().copied()),
                ModuleItem::Annex(child) => self.collect_paths_into(*child, out),
                ModuleItem::Decl(_) | ModuleItem::Impl(_) => {}
            }
        }
    }
}

#[inline]
fn to_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests;
