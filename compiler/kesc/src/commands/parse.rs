//! The `parse` command: show what the parser extracts from one file.

use std::path::Path;

use kes_ir::ParsedItem;

pub fn parse_command(path: &str) {
    let module = match kes_parse::parse_file(Path::new(path)) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("{}", err.to_diagnostic(Path::new(path)));
            std::process::exit(1);
        }
    };

    println!("Parse result for '{path}' ({} items):", module.items.len());
    for item in &module.items {
        match item {
            ParsedItem::Import(import) => {
                let targets: Vec<String> = import.targets.iter().map(ToString::to_string).collect();
                println!("  import:{} {} @ {}", import.lang, targets.join(", "), import.span);
            }
            ParsedItem::Decl(decl) => {
                println!("  {} {} @ {}", decl.kind.keyword(), decl.name, decl.span);
            }
            ParsedItem::Impl(def) => {
                println!("  impl {} @ {}", def.target.join("."), def.span);
            }
        }
    }
}
