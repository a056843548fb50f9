//! Declaration binding.
//!
//! Walks the linked forest and records every name it declares, defines or
//! imports in a [`ScopeTree`]:
//!
//! - each module (annexes excluded) gets one scope under the root
//! - annexes bind into their owner's scope, in child order
//! - `test` blocks get a scope of their own
//!
//! Declarations in native modules must be unique per scope (`E3010`);
//! foreign modules may redefine names freely. Once everything is bound, an
//! `impl` whose owner is declared nowhere along its scope chain is reported
//! (`E3011`).

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use kes_diagnostic::{Diagnostic, DiagnosticBag, ErrorCode};
use kes_ir::{DeclKind, ModuleGraph, ModuleId, ModuleItem, NodeRef, SourceLang, Span};
use kes_symtab::{ScopeId, ScopeTree, SymbolHit};

/// Where in the forest a name occurs.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SymbolSite {
    pub module: ModuleId,
    pub span: Span,
}

/// Output of [`bind`].
#[derive(Debug)]
pub struct Bindings {
    pub scopes: ScopeTree<SymbolSite>,
    /// Scope of every non-annex module.
    pub module_scopes: FxHashMap<ModuleId, ScopeId>,
    pub diagnostics: DiagnosticBag,
}

impl Bindings {
    pub fn scope_of(&self, module: ModuleId) -> Option<ScopeId> {
        self.module_scopes.get(&module).copied()
    }
}

/// Bind every module in `graph`.
#[tracing::instrument(level = "debug", skip_all, fields(modules = graph.len()))]
pub fn bind(graph: &ModuleGraph) -> Bindings {
    let annexes: FxHashSet<ModuleId> = graph
        .modules()
        .flat_map(|(_, m)| [m.impl_annex, m.test_annex])
        .flatten()
        .collect();

    let mut binder = Binder {
        graph,
        scopes: ScopeTree::new(),
        diagnostics: DiagnosticBag::new(),
    };
    let root = binder.scopes.root();

    let mut module_scopes = FxHashMap::default();
    let mut bound = Vec::new();
    for (id, _) in graph.modules().filter(|(id, _)| !annexes.contains(id)) {
        let scope = binder.scopes.push_scope(root);
        module_scopes.insert(id, scope);
        binder.bind_module(id, id, scope, &mut bound);
    }
    binder.check_definitions(&bound);

    debug!(
        scopes = binder.scopes.len(),
        errors = binder.diagnostics.error_count(),
        "bound"
    );
    Bindings {
        scopes: binder.scopes,
        module_scopes,
        diagnostics: binder.diagnostics,
    }
}

struct Binder<'g> {
    graph: &'g ModuleGraph,
    scopes: ScopeTree<SymbolSite>,
    diagnostics: DiagnosticBag,
}

impl<'g> Binder<'g> {
    /// Bind the items of `module` into `scope`; `owner` is the module whose
    /// scope it is. Records every scope used into `bound`.
    fn bind_module(
        &mut self,
        module: ModuleId,
        owner: ModuleId,
        scope: ScopeId,
        bound: &mut Vec<ScopeId>,
    ) {
        if !bound.contains(&scope) {
            bound.push(scope);
        }
        let graph = self.graph;
        let unique = graph.module(owner).lang == SourceLang::Native;

        for item in &graph.module(module).items {
            match item {
                ModuleItem::Import(stmt) => {
                    for &path in &stmt.paths {
                        let target = &graph.path(path).target;
                        let name = target
                            .alias
                            .as_deref()
                            .or(target.segments.last().map(String::as_str));
                        if let Some(name) = name {
                            let site = SymbolSite {
                                module,
                                span: target.span,
                            };
                            self.scopes.insert(scope, name, SymbolHit::Decl, site, false);
                        }
                    }
                }
                ModuleItem::Decl(decl) if decl.kind == DeclKind::Test => {
                    let test_scope = self.scopes.push_scope(scope);
                    let site = SymbolSite {
                        module,
                        span: decl.span,
                    };
                    self.scopes.insert(test_scope, &decl.name, SymbolHit::Decl, site, true);
                }
                ModuleItem::Decl(decl) => {
                    let site = SymbolSite {
                        module,
                        span: decl.span,
                    };
                    if let Some(prior) =
                        self.scopes.insert(scope, &decl.name, SymbolHit::Decl, site, unique)
                    {
                        self.redeclared(&decl.name, site, prior);
                    }
                }
                ModuleItem::Impl(def) => {
                    if let Some(name) = def.owner() {
                        let site = SymbolSite {
                            module,
                            span: def.span,
                        };
                        self.scopes.insert(scope, name, SymbolHit::Defn, site, false);
                    }
                }
                ModuleItem::Annex(annex) => self.bind_module(*annex, owner, scope, bound),
            }
        }
    }

    fn redeclared(&mut self, name: &str, site: SymbolSite, prior: SymbolSite) {
        let file = self.file(site.module);
        let mut diag = Diagnostic::error(ErrorCode::E3010)
            .with_message(format!("`{name}` is declared more than once"))
            .in_file(file)
            .at_node(NodeRef::Module(site.module))
            .with_label(site.span, "redeclared here");
        diag = if prior.module == site.module {
            diag.with_secondary_label(prior.span, "first declared here")
        } else {
            diag.with_cross_file_label(self.file(prior.module), prior.span, "first declared here")
        };
        self.diagnostics.push(diag);
    }

    /// Report every defined name with no declaration in scope.
    fn check_definitions(&mut self, bound: &[ScopeId]) {
        let mut orphans: Vec<(String, SymbolSite)> = Vec::new();
        for &scope in bound {
            for sym in self.scopes.symbols(scope) {
                let Some(&first) = sym.defn.first() else {
                    continue;
                };
                let declared = self
                    .scopes
                    .lookup(scope, &sym.name, true)
                    .is_some_and(|s| s.decl.is_some());
                if !declared {
                    orphans.push((sym.name.clone(), first));
                }
            }
        }
        orphans.sort_by_key(|(_, site)| (site.module, site.span.start));

        for (name, site) in orphans {
            let diag = Diagnostic::warning(ErrorCode::E3011)
                .with_message(format!("`{name}` is implemented but never declared"))
                .in_file(self.file(site.module))
                .at_node(NodeRef::Module(site.module))
                .with_label(site.span, "implemented here");
            self.diagnostics.push(diag);
        }
    }

    fn file(&self, module: ModuleId) -> &'g Path {
        let graph: &'g ModuleGraph = self.graph;
        &graph.module(module).path
    }
}
