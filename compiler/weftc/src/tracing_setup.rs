//! Tracing subscriber setup.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call more than once. Nothing is installed unless `WEFT_LOG` is
/// set; its value is an `EnvFilter` directive such as `weft_eval=debug`.
/// Spans are printed to stderr as an indented tree.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("WEFT_LOG").is_ok() {
            let filter = EnvFilter::from_env("WEFT_LOG");
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        }
    });
}
