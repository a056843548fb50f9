//! Foreign (Python) module bridging.
//!
//! Kestrel programs may `import:py` modules of the Python host ecosystem.
//! The front end never runs Python: it finds a module's origin file with a
//! static model of the host's import system ([`HostLocator`]), reads the
//! source, and adapts its top-level imports and definitions into the same
//! [`ParsedModule`](kes_ir::ParsedModule) shape native files produce.
//!
//! ```text
//! ForeignBridge::bridge(name)
//!   ├── HostLocator::locate(name)      not found / builtin / frozen / extension → opaque leaf
//!   ├── import table hit                → cached module, nothing to expand
//!   ├── adapter::adapt(source)          benign failure → opaque leaf
//!   └── BridgePolicy::permits(import)   filters the module's own imports
//! ```

pub mod adapter;
mod bridge;
mod locator;
mod policy;

pub use adapter::AdaptError;
pub use bridge::{BridgeError, Bridged, ForeignBridge};
pub use locator::{HostLocator, Located, OriginKind, SearchPathLocator};
pub use policy::BridgePolicy;
