//! Command handlers for the `kesc` CLI.
//!
//! Each submodule implements one command. Option parsing and diagnostic
//! reporting shared between them live here.

use std::path::PathBuf;

use kes_diagnostic::DiagnosticBag;

use crate::resolve::{ModuleResolver, ResolveConfig, ResolveOutput};

mod deps;
mod explain;
mod parse;
mod symbols;

pub use deps::deps_command;
pub use explain::explain_error;
pub use parse::parse_command;
pub use symbols::symbols_command;

/// Options shared by the commands that resolve an entry file.
#[derive(Clone, Debug)]
pub struct ResolveOptions {
    pub file: PathBuf,
    pub config: ResolveConfig,
}

/// Parse `<file> [--no-bridge] [--allow=<module>]... [--host-path=<dir>]...`.
///
/// The configuration starts from [`ResolveConfig::from_env`]; `--host-path`
/// directories are searched before those from the environment.
pub fn parse_resolve_options(args: &[String]) -> Result<ResolveOptions, String> {
    parse_resolve_options_with(args, ResolveConfig::from_env())
}

pub(crate) fn parse_resolve_options_with(
    args: &[String],
    base: ResolveConfig,
) -> Result<ResolveOptions, String> {
    let mut file = None;
    let mut no_bridge = false;
    let mut allow = Vec::new();
    let mut host_paths = Vec::new();

    for arg in args {
        if arg == "--no-bridge" {
            no_bridge = true;
        } else if let Some(module) = arg.strip_prefix("--allow=") {
            if module.is_empty() {
                return Err("--allow needs a module name".to_string());
            }
            allow.push(module.to_string());
        } else if let Some(dir) = arg.strip_prefix("--host-path=") {
            if dir.is_empty() {
                return Err("--host-path needs a directory".to_string());
            }
            host_paths.push(PathBuf::from(dir));
        } else if arg.starts_with('-') {
            return Err(format!("unknown option '{arg}'"));
        } else if file.is_none() {
            file = Some(PathBuf::from(arg));
        } else {
            return Err(format!("unexpected argument '{arg}'"));
        }
    }

    let Some(file) = file else {
        return Err("missing file path".to_string());
    };

    let mut config = base;
    for module in allow {
        config.policy = config.policy.allow(module);
    }
    if no_bridge {
        config.policy = config.policy.with_enabled(false);
    }
    host_paths.append(&mut config.host_paths);
    config.host_paths = host_paths;

    Ok(ResolveOptions { file, config })
}

/// Print diagnostics to stderr.
pub(crate) fn report(diagnostics: &DiagnosticBag) {
    for diag in diagnostics {
        eprintln!("{diag}");
    }
    if !diagnostics.is_empty() {
        eprintln!(
            "{} error(s), {} warning(s)",
            diagnostics.error_count(),
            diagnostics.warning_count()
        );
    }
}

/// Resolve the entry file, exiting with its parse error on failure.
pub(crate) fn resolve_entry(options: &ResolveOptions) -> (ModuleResolver, ResolveOutput) {
    let mut resolver = ModuleResolver::new(options.config.clone());
    match resolver.resolve(&options.file) {
        Ok(output) => (resolver, output),
        Err(err) => {
            eprintln!("{}", err.to_diagnostic(&options.file));
            std::process::exit(1);
        }
    }
}
