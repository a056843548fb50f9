//! The `deps` command: list every module reachable from an entry file.

use super::{report, resolve_entry, ResolveOptions};

pub fn deps_command(options: &ResolveOptions) {
    let (resolver, output) = resolve_entry(options);
    let graph = resolver.graph();

    let mut deps: Vec<_> = output.deps.iter().collect();
    deps.sort();

    println!("Modules reachable from '{}' ({}):", options.file.display(), deps.len());
    for (path, &id) in deps {
        let module = graph.module(id);
        let marker = if id == output.root { "*" } else { " " };
        println!("{marker} [{}] {} {}", module.lang, module.name, path.display());
        for import in module.imports() {
            for &path_id in &import.paths {
                let mpath = graph.path(path_id);
                match mpath.sub_module {
                    Some(sub) => println!(
                        "      {} -> {}",
                        mpath.target,
                        graph.module(sub).path.display()
                    ),
                    None => println!("      {} (unresolved)", mpath.target),
                }
            }
        }
    }

    report(&output.diagnostics);
    if output.diagnostics.has_errors() {
        std::process::exit(1);
    }
}
