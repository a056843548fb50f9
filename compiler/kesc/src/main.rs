//! Kestrel compiler CLI.

use kesc::commands::{
    deps_command, explain_error, parse_command, parse_resolve_options, symbols_command,
};

fn main() {
    kesc::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "deps" | "symbols" => {
            let options = match parse_resolve_options(&args[2..]) {
                Ok(options) => options,
                Err(msg) => {
                    eprintln!("error: {msg}");
                    eprintln!("Usage: kesc {command} <file.kes> [options]");
                    eprintln!();
                    print_resolve_options();
                    std::process::exit(1);
                }
            };
            if command == "deps" {
                deps_command(&options);
            } else {
                symbols_command(&options);
            }
        }
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: kesc parse <file.kes>");
                std::process::exit(1);
            }
            parse_command(&args[2]);
        }
        "explain" => {
            if args.len() < 3 {
                eprintln!("Usage: kesc explain <code>");
                eprintln!("Example: kesc explain E3001");
                std::process::exit(1);
            }
            explain_error(&args[2]);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-V" => {
            println!("kesc {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("Kestrel Compiler");
    println!();
    println!("Usage: kesc <command> [options]");
    println!();
    println!("Commands:");
    println!("  deps <file>      Resolve imports and list every reachable module");
    println!("  symbols <file>   Resolve, bind declarations, and dump module scopes");
    println!("  parse <file>     Show the items the parser extracts from one file");
    println!("  explain <code>   Describe an error code");
    println!("  help             Show this message");
    println!("  version          Show the compiler version");
    println!();
    print_resolve_options();
}

fn print_resolve_options() {
    println!("Options for deps/symbols:");
    println!("  --no-bridge          Never bridge foreign (import:py) modules");
    println!("  --allow=<module>     Only bridge this module and its submodules (repeatable)");
    println!("  --host-path=<dir>    Search <dir> for foreign modules (repeatable)");
    println!();
    println!("Environment:");
    println!("  KES_HOST_PATH        Extra foreign search directories (path list)");
    println!("  KES_LOG              Tracing filter, e.g. kesc=debug");
}
