//! The `symbols` command: resolve, bind, and dump each module scope.

use kes_symtab::Symbol;

use super::{report, resolve_entry, ResolveOptions};
use crate::bind::{bind, SymbolSite};

pub fn symbols_command(options: &ResolveOptions) {
    let (resolver, output) = resolve_entry(options);
    let graph = resolver.graph();
    let bindings = bind(graph);

    let mut modules: Vec<_> = bindings.module_scopes.iter().collect();
    modules.sort_by_key(|(&id, _)| &graph.module(id).path);

    for (&id, &scope) in modules {
        let module = graph.module(id);
        println!("{} ({}):", module.name, module.path.display());
        let mut symbols: Vec<&Symbol<SymbolSite>> = bindings.scopes.symbols(scope).collect();
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        for sym in symbols {
            let decl = sym
                .decl
                .map_or_else(|| "-".to_string(), |site| site.span.to_string());
            println!(
                "  {:<24} decl {:<10} defn {:<3} uses {}",
                sym.name,
                decl,
                sym.defn.len(),
                sym.uses.len()
            );
        }
    }

    let mut diagnostics = output.diagnostics;
    diagnostics.extend(bindings.diagnostics.into_vec());
    report(&diagnostics);
    if diagnostics.has_errors() {
        std::process::exit(1);
    }
}
