//! Turning a host module name into a linked [`Module`](kes_ir::Module).

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use kes_ir::path::canonical;
use kes_ir::{ModuleGraph, ModuleId, ModulePathId, SourceLang};

use crate::adapter::{self, AdaptError};
use crate::{BridgePolicy, HostLocator, SearchPathLocator};

/// A failure that is worth reporting.
///
/// Everything that merely means "this module cannot be bridged" (unknown
/// name, no source, benign adapter failure) is `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot adapt `{}`: {source}", path.display())]
    Adapt { path: PathBuf, source: AdaptError },
}

impl BridgeError {
    /// Origin file the failure is about.
    pub fn path(&self) -> &Path {
        match self {
            BridgeError::Read { path, .. } | BridgeError::Adapt { path, .. } => path,
        }
    }
}

/// A successfully bridged host module.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Bridged {
    pub module: ModuleId,
    /// The module's own import paths that should be resolved next.
    ///
    /// Empty when the module came out of the import table.
    pub expansion: Vec<ModulePathId>,
    /// The module was already in the import table.
    pub cached: bool,
}

/// Bridges host modules into a [`ModuleGraph`].
#[derive(Clone, Debug, Default)]
pub struct ForeignBridge<L = SearchPathLocator> {
    locator: L,
    policy: BridgePolicy,
}

impl<L: HostLocator> ForeignBridge<L> {
    pub fn new(locator: L, policy: BridgePolicy) -> Self {
        ForeignBridge { locator, policy }
    }

    /// Bridge dotted module `name`, imported from a file in `importer_dir`.
    ///
    /// Returns `Ok(None)` when the policy refuses the name or the module has
    /// no source the adapter can use.
    #[tracing::instrument(level = "debug", skip(self, graph))]
    pub fn bridge(
        &self,
        name: &str,
        importer_dir: Option<&Path>,
        graph: &mut ModuleGraph,
    ) -> Result<Option<Bridged>, BridgeError> {
        if !self.policy.permits(name) {
            debug!("not permitted by policy");
            return Ok(None);
        }

        let located = self.locator.locate(name, importer_dir);
        let Some(origin) = located.source_path() else {
            debug!(kind = ?located.kind, "no source to bridge");
            return Ok(None);
        };
        let origin = canonical(origin);

        if let Some(module) = graph.lookup(&origin) {
            return Ok(Some(Bridged {
                module,
                expansion: Vec::new(),
                cached: true,
            }));
        }

        let bytes = match std::fs::read(&origin) {
            Ok(bytes) => bytes,
            Err(source) => return Err(BridgeError::Read { path: origin, source }),
        };
        let parsed = match adapter::adapt(&bytes) {
            Ok(parsed) => parsed,
            Err(err) if err.is_benign() => {
                debug!(%err, "benign adapter failure");
                return Ok(None);
            }
            Err(source) => return Err(BridgeError::Adapt { path: origin, source }),
        };

        let module = graph.insert(origin, SourceLang::Foreign, parsed);
        graph.module_mut(module).is_imported = true;

        let expansion: Vec<ModulePathId> = graph
            .collect_paths(module)
            .into_iter()
            .filter(|&id| {
                let target = &graph.path(id).target;
                !target.is_relative() && self.policy.permits(&target.dotted())
            })
            .collect();
        debug!(expanded = expansion.len(), "bridged");

        Ok(Some(Bridged {
            module,
            expansion,
            cached: false,
        }))
    }
}
