//! Which host modules may be bridged.

use rustc_hash::FxHashSet;

/// Host stdlib modules implemented (wholly or mostly) in native code.
///
/// Their Python shims either have no useful source or import straight into
/// extension modules, so following them only inflates the forest.
pub const NATIVE_STDLIB: &[&str] = &[
    "_bisect",
    "_blake2",
    "_bz2",
    "_contextvars",
    "_datetime",
    "_decimal",
    "_hashlib",
    "_heapq",
    "_lzma",
    "_md5",
    "_opcode",
    "_pickle",
    "_posixsubprocess",
    "_random",
    "_sha1",
    "_sha2",
    "_sha3",
    "_socket",
    "_ssl",
    "_statistics",
    "_struct",
    "array",
    "binascii",
    "encodings",
    "fcntl",
    "grp",
    "importlib",
    "math",
    "pyexpat",
    "re",
    "readline",
    "select",
    "termios",
    "unicodedata",
    "zlib",
];

/// Allow-list and deny-list for foreign imports.
///
/// A name matches a list entry when it equals the entry or is a dotted
/// submodule of it (`os.path` matches `os`). Deny wins over allow. With an
/// empty allow-list every name not denied is permitted.
#[derive(Clone, Debug)]
pub struct BridgePolicy {
    enabled: bool,
    allow: FxHashSet<String>,
    deny: FxHashSet<String>,
}

impl Default for BridgePolicy {
    fn default() -> Self {
        BridgePolicy {
            enabled: true,
            allow: FxHashSet::default(),
            deny: NATIVE_STDLIB.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl BridgePolicy {
    /// A policy that bridges nothing.
    pub fn disabled() -> Self {
        BridgePolicy {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn allow(mut self, name: impl Into<String>) -> Self {
        self.allow.insert(name.into());
        self
    }

    #[must_use]
    pub fn deny(mut self, name: impl Into<String>) -> Self {
        self.deny.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether dotted module `name` may be bridged.
    pub fn permits(&self, name: &str) -> bool {
        if !self.enabled || name.is_empty() {
            return false;
        }
        if matches_any(&self.deny, name) {
            return false;
        }
        self.allow.is_empty() || matches_any(&self.allow, name)
    }
}

/// `name` itself or any of its dotted prefixes is in `set`.
fn matches_any(set: &FxHashSet<String>, name: &str) -> bool {
    if set.contains(name) {
        return true;
    }
    name.match_indices('.')
        .any(|(dot, _)| set.contains(&name[..dot]))
}
