//! Kestrel compiler front end.
//!
//! ```text
//! entry.kes
//!     │  kes_parse
//!     ▼
//! ModuleResolver::resolve ──► ModuleGraph (every reachable module, linked)
//!     │                         ├── native imports: parse + annex
//!     │                         └── foreign imports: ForeignBridge
//!     ▼
//! bind ──► Bindings (one scope per module, decl/defn/use sites)
//! ```

use std::sync::Once;

pub mod bind;
pub mod commands;
pub mod resolve;

pub use bind::{bind, Bindings, SymbolSite};
pub use resolve::{
    ModuleResolver, NativeParser, ResolveConfig, ResolveOutput, SourceParser, HOST_PATH_ENV,
};

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "KES_LOG";

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber, once per process.
///
/// Nothing is installed unless `KES_LOG` is set; its value is an
/// `EnvFilter` directive such as `kesc=debug,kes_foreign=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var_os(LOG_ENV).is_some() {
            let filter = EnvFilter::from_env(LOG_ENV);
            tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
