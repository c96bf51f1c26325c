//! Request profiling.
//!
//! When `--profile <path>` is passed, store requests are recorded as a
//! Chrome-compatible trace that can be opened in `chrome://tracing` or
//! https://ui.perfetto.dev/

use std::path::PathBuf;
use tracing_subscriber::prelude::*;

/// Flushes the trace file when dropped. Hold it until the UI exits.
pub struct ProfileGuard {
    _guard: tracing_chrome::FlushGuard,
}

/// Returns `None` when profiling was not requested.
pub fn init(output_path: Option<PathBuf>) -> Option<ProfileGuard> {
    let output_path = output_path?;

    let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
        .file(output_path)
        .include_args(true)
        .build();

    if tracing_subscriber::registry()
        .with(chrome_layer)
        .try_init()
        .is_err()
    {
        log::warn!("A tracing subscriber is already installed; profile may be empty");
    }

    tracing::info!("profiling enabled");
    Some(ProfileGuard { _guard: guard })
}
