//! Canonical module paths.
//!
//! The import table is keyed by path, so two spellings of the same file
//! (`src/./a.kes`, `src/lib/../a.kes`) must collapse to one key. This is a
//! lexical normalization: symlinks are not followed and the file need not
//! exist.

use std::path::{Component, Path, PathBuf};

/// Lexically resolve `.` and `..` components.
///
/// `..` at the root (or at the start of a relative path) is kept only for
/// relative paths; for absolute paths it is dropped, matching what the OS does.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => out.push(component),
        }
    }
    out
}

/// Normalize and make absolute against the current directory.
pub fn canonical(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        match std::env::current_dir() {
            Ok(cwd) => normalize(&cwd.join(path)),
            Err(_) => normalize(path),
        }
    }
}

/// Visible name of the module stored at `path`.
///
/// Package entry files (`mod.kes`, `__init__.py`) take their directory's name.
pub fn module_name(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem == "mod" || stem == "__init__" {
        if let Some(dir) = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
        {
            return dir.to_string();
        }
    }
    stem.to_string()
}
